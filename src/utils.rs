use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Loads all .txt files from a directory as (filename, content) pairs,
/// sorted by filename so store indices are reproducible across rebuilds.
pub fn load_documents(dir: impl AsRef<Path>) -> Result<Vec<(String, String)>> {
    let dir = dir.as_ref();
    let mut documents = Vec::new();

    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            let filename = entry.file_name().to_string_lossy().into_owned();
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            documents.push((filename, content.trim().to_string()));
        }
    }

    documents.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_documents_sorted_txt_only() -> Result<()> {
        let dir = tempdir()?;
        for (name, content) in [
            ("b_second.txt", "second"),
            ("a_first.txt", "first\n"),
            ("ignored.md", "not text"),
        ] {
            let mut file = File::create(dir.path().join(name))?;
            write!(file, "{content}")?;
        }

        let docs = load_documents(dir.path())?;
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0], ("a_first.txt".to_string(), "first".to_string()));
        assert_eq!(docs[1], ("b_second.txt".to_string(), "second".to_string()));
        Ok(())
    }

    #[test]
    fn test_load_documents_missing_dir_is_an_error() {
        assert!(load_documents("/definitely/not/a/dir").is_err());
    }
}
