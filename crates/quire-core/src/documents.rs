//! Discovering markdown documents in a user-chosen directory.
//!
//! Only files directly under the root are read, in file-name order, so the
//! same folder always yields the same document sequence.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// A document we found: file name, stem and raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// File name including extension (e.g. `policies.md`). Used as chunk provenance.
    pub name: String,
    /// File name without extension. Prefixes chunk ids.
    pub stem: String,
    pub text: String,
}

impl Document {
    /// Build a document from a name like `guide.md`; the stem is everything before the last `.`.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let name = name.into();
        let stem = Path::new(&name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());
        Self {
            name,
            stem,
            text: text.into(),
        }
    }
}

/// Scans `root` for `.md` files (not descending into subdirectories) and reads them.
pub fn scan_documents(root: &Path) -> Result<Vec<Document>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let mut docs = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry.map_err(|e| ScanError::Walk(e.to_string()))?;
        let path = entry.path();
        if path.extension().map_or(false, |e| e == "md") && path.is_file() {
            let text = std::fs::read_to_string(path)
                .map_err(|e| ScanError::Read(path.to_path_buf(), e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            docs.push(Document::new(name, text));
        }
    }
    tracing::debug!(root = %root.display(), documents = docs.len(), "scanned documents");
    Ok(docs)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("walk error: {0}")]
    Walk(String),
    #[error("read error for {0}: {1}")]
    Read(PathBuf, std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_strips_extension() {
        let d = Document::new("pricing.md", "x");
        assert_eq!(d.name, "pricing.md");
        assert_eq!(d.stem, "pricing");
    }

    #[test]
    fn scan_reads_markdown_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.md"), "second").unwrap();
        std::fs::write(dir.path().join("a.md"), "first").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join(".hidden.md"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("c.md"), "nested").unwrap();

        let docs = scan_documents(dir.path()).unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["a.md", "b.md"]);
        assert_eq!(docs[0].text, "first");
    }

    #[test]
    fn scan_rejects_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.md");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(scan_documents(&file), Err(ScanError::NotADirectory(_))));
    }
}
