//! Reading PDF documents: finding them on disk and pulling out their text.
//!
//! Text is extracted page by page in page order. A page that yields nothing
//! (scanned image, unsupported font encoding) contributes an empty string.

use std::path::{Path, PathBuf};

use lopdf::Document;
use walkdir::WalkDir;

/// An uploaded PDF: display name and raw bytes.
#[derive(Debug, Clone)]
pub struct PdfSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PdfSource {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a PDF file. The file name becomes the source name.
    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        let bytes = std::fs::read(path).map_err(|e| ScanError::Read(path.to_path_buf(), e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// Text of one document plus how many pages it had.
#[derive(Debug, Clone)]
pub struct DocumentText {
    pub text: String,
    pub pages: usize,
}

/// Extract the text of every page, concatenated in page order, plus the page count.
pub fn extract_document(bytes: &[u8]) -> Result<DocumentText, ExtractError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractError::Load(e.to_string()))?;
    if doc.is_encrypted() {
        return Err(ExtractError::Encrypted);
    }
    let pages = doc.get_pages();
    let mut text = String::new();
    for &page_num in pages.keys() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => tracing::warn!(page = page_num, "no extractable text: {e}"),
        }
    }
    Ok(DocumentText {
        text,
        pages: pages.len(),
    })
}

/// Collects PDFs from `path`: the file itself, or every `.pdf` under a directory
/// (sorted by path, hidden entries skipped, symlinks not followed).
pub fn collect_pdfs(path: &Path) -> Result<Vec<PdfSource>, ScanError> {
    if path.is_file() {
        if !is_pdf(path) {
            return Err(ScanError::NotAPdf(path.to_path_buf()));
        }
        return Ok(vec![PdfSource::from_path(path)?]);
    }
    if !path.is_dir() {
        return Err(ScanError::NotFound(path.to_path_buf()));
    }
    let mut paths = Vec::new();
    for entry in WalkDir::new(path)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        let entry = entry.map_err(|e| ScanError::Walk(e.to_string()))?;
        if entry.file_type().is_file() && is_pdf(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.iter().map(|p| PdfSource::from_path(p)).collect()
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map_or(false, |e| e.eq_ignore_ascii_case("pdf"))
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unreadable PDF: {0}")]
    Load(String),
    #[error("PDF is encrypted")]
    Encrypted,
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("no such file or directory: {0}")]
    NotFound(PathBuf),
    #[error("not a PDF file: {0}")]
    NotAPdf(PathBuf),
    #[error("walk error: {0}")]
    Walk(String),
    #[error("read error for {0}: {1}")]
    Read(PathBuf, std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::make_pdf;

    #[test]
    fn extracts_single_page() {
        let pdf = make_pdf(&["The sky is blue."]).unwrap();
        let text = extract_document(&pdf).unwrap().text;
        assert!(text.contains("The sky is blue."), "got {text:?}");
    }

    #[test]
    fn pages_are_concatenated_in_order() {
        let pdf = make_pdf(&["First page", "Second page"]).unwrap();
        let doc = extract_document(&pdf).unwrap();
        assert_eq!(doc.pages, 2);
        let first = doc.text.find("First page").unwrap();
        let second = doc.text.find("Second page").unwrap();
        assert!(first < second);
    }

    #[test]
    fn blank_page_contributes_nothing() {
        let pdf = make_pdf(&["Opening remarks", "", "Closing remarks"]).unwrap();
        let doc = extract_document(&pdf).unwrap();
        assert_eq!(doc.pages, 3);
        let first = doc.text.find("Opening remarks").unwrap();
        let third = doc.text.find("Closing remarks").unwrap();
        assert!(first < third);
    }

    #[test]
    fn garbage_is_an_extraction_error() {
        let err = extract_document(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Load(_)));
    }

    #[test]
    fn collect_pdfs_walks_directory_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), make_pdf(&["b"]).unwrap()).unwrap();
        std::fs::write(dir.path().join("a.PDF"), make_pdf(&["a"]).unwrap()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join(".hidden")).unwrap();
        std::fs::write(dir.path().join(".hidden/c.pdf"), make_pdf(&["c"]).unwrap()).unwrap();

        let found = collect_pdfs(dir.path()).unwrap();
        let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a.PDF", "b.pdf"]);
    }

    #[test]
    fn collect_pdfs_rejects_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, "x").unwrap();
        assert!(matches!(collect_pdfs(&txt), Err(ScanError::NotAPdf(_))));
        assert!(matches!(
            collect_pdfs(&dir.path().join("missing")),
            Err(ScanError::NotFound(_))
        ));
    }
}
