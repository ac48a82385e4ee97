use crate::config::Config;
use crate::embedding::EmbeddingClient;
use crate::llm::{ChatClient, Message};
use crate::vector_store::{SearchResult, VectorStore};
use anyhow::Result;
use std::path::Path;

/// Retrieval-augmented generation over a persisted vector store.
pub struct RagSystem {
    store: VectorStore,
    embedder: EmbeddingClient,
    chat: ChatClient,
}

impl RagSystem {
    /// Loads the store from disk and builds the network clients.
    pub fn open(config: Config, store_path: impl AsRef<Path>) -> Result<Self> {
        println!("Loading vector store...");
        let store = VectorStore::load(store_path)?;
        println!("Ready with {} chunks\n", store.len());

        Ok(RagSystem {
            store,
            embedder: EmbeddingClient::new(config.clone())?,
            chat: ChatClient::new(config)?,
        })
    }

    /// Answers a question, retrieving context first unless `use_retrieval`
    /// is false (the no-RAG baseline for comparison).
    pub fn answer(&self, question: &str, top_k: usize, use_retrieval: bool) -> Result<String> {
        if !use_retrieval {
            let messages = vec![Message::user(question)];
            return Ok(self.chat.generate(&messages));
        }

        let results = self.store.search(&self.embedder, question, top_k)?;
        if results.is_empty() {
            println!("No relevant chunks found");
            let messages = vec![Message::user(question)];
            return Ok(self.chat.generate(&messages));
        }

        for (i, r) in results.iter().enumerate() {
            let preview: String = r.chunk.text.chars().take(60).collect();
            println!("  {}. Score: {:.3} - {preview}...", i + 1, r.score);
        }

        let prompt = augmented_prompt(question, &results);
        let messages = vec![Message::user(prompt)];
        Ok(self.chat.generate(&messages))
    }

    /// Prints the answer with and without retrieval side by side.
    pub fn compare(&self, question: &str, top_k: usize) -> Result<()> {
        println!("\n{}", "=".repeat(70));
        println!("QUESTION: {question}");
        println!("{}", "=".repeat(70));

        println!("\n{}", "-".repeat(70));
        println!("WITHOUT RAG (LLM baseline):");
        println!("{}", "-".repeat(70));
        println!("{}\n", self.answer(question, top_k, false)?);

        println!("{}", "-".repeat(70));
        println!("WITH RAG (Retrieval + LLM):");
        println!("{}", "-".repeat(70));
        println!("{}\n", self.answer(question, top_k, true)?);

        println!("{}", "=".repeat(70));
        Ok(())
    }
}

/// Formats retrieved chunks into a context block and wraps them with the
/// question in an instruction that keeps the model grounded in the store.
fn augmented_prompt(question: &str, results: &[SearchResult<'_>]) -> String {
    let context_parts: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let source = r
                .chunk
                .metadata
                .get("source")
                .map(String::as_str)
                .unwrap_or("unknown");
            format!("[Source {}: {source}]\n{}", i + 1, r.chunk.text)
        })
        .collect();
    let context = context_parts.join("\n\n");

    format!(
        "Answer the question using ONLY the context below. If the answer isn't in the context, \
         say \"I don't have that information in my knowledge base.\"\n\n\
         Context:\n{context}\n\nQuestion: {question}\n\nAnswer:"
    )
}
