mod config;
mod embedding;
mod llm;
mod rag;
mod utils;
mod vector_store;

use anyhow::Result;
use config::Config;
use embedding::EmbeddingClient;
use rag::RagSystem;
use std::collections::HashMap;
use std::env;
use std::io::{BufRead, Write};
use vector_store::VectorStore;

const DEFAULT_STORE_FILE: &str = "rag_store.json";
const DEFAULT_KB_DIR: &str = "knowledge_base";
const DEFAULT_TOP_K: usize = 3;

fn build_index(config: Config, kb_dir: &str, store_file: &str) -> Result<()> {
    println!("Loading documents from '{kb_dir}'...");
    let documents = utils::load_documents(kb_dir)?;
    println!("Found {} documents\n", documents.len());

    let embedder = EmbeddingClient::new(config)?;
    let mut store = VectorStore::new();

    // One file = one chunk, filename recorded as its source.
    for (filename, content) in documents {
        let preview: String = content.chars().take(50).collect();
        println!("Adding: {preview}...");
        let metadata = HashMap::from([("source".to_string(), filename)]);
        store.add_text(&embedder, content, metadata)?;
    }

    store.save(store_file)?;
    println!("\nDone! Saved {} chunks to {store_file}", store.len());
    if store.failed_embeddings() > 0 {
        eprintln!(
            "Warning: {} chunks fell back to zero-vector embeddings",
            store.failed_embeddings()
        );
    }
    Ok(())
}

fn query_loop(config: Config, store_file: &str) -> Result<()> {
    let rag = RagSystem::open(config, store_file)?;

    println!("RAG system ready. Commands:");
    println!("  - Type a question to answer it with retrieval");
    println!("  - Type 'compare: <question>' to see with/without RAG");
    println!("  - Type 'exit' to quit\n");

    let stdin = std::io::stdin();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            break;
        }

        if let Some(question) = input.strip_prefix("compare:") {
            rag.compare(question.trim(), DEFAULT_TOP_K)?;
        } else {
            let answer = rag.answer(input, DEFAULT_TOP_K, true)?;
            println!("\nAnswer: {answer}\n");
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let config = Config::from_env()?;
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("build") => {
            let kb_dir = args.get(2).map(String::as_str).unwrap_or(DEFAULT_KB_DIR);
            let store_file = args
                .get(3)
                .map(String::as_str)
                .unwrap_or(DEFAULT_STORE_FILE);
            build_index(config, kb_dir, store_file)
        }
        Some(store_file) => query_loop(config, store_file),
        None => query_loop(config, DEFAULT_STORE_FILE),
    }
}
