//! Documents as a sequence of pages of plain text.
//!
//! A document stands in for the text extracted from a PDF: one string per
//! page. It can be loaded from a single text file (one page), from a
//! directory of `.txt` files (one page per file, in path order), or from any
//! reader such as stdin.

use std::{
    ffi::OsStr,
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

/// File extension of page files inside a document directory.
pub const PAGE_EXTENSION: &str = "txt";

const PAGE_SEPARATOR: &str = "\n\n";

/// Errors raised while loading a document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The path does not exist.
    #[error("no such file or directory: {}", .0.display())]
    NotFound(PathBuf),

    /// The path exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A directory contained no page files.
    #[error("no .{PAGE_EXTENSION} pages found in {}", .0.display())]
    NoPages(PathBuf),
}

/// The text of a document, page by page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pages: Vec<String>,
}

impl Document {
    /// Creates a document from pages of text.
    #[must_use]
    pub const fn from_pages(pages: Vec<String>) -> Self {
        Self { pages }
    }

    /// Loads a document from a file or a directory of page files.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist, a file cannot be read,
    /// or a directory holds no `.txt` files.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        if path.is_dir() {
            let page_paths = collect_page_paths(path);
            if page_paths.is_empty() {
                return Err(LoadError::NoPages(path.to_path_buf()));
            }
            tracing::debug!("Loading {} page(s) from {}", page_paths.len(), path.display());
            let pages = page_paths
                .iter()
                .map(|page| read_page(page))
                .collect::<Result<_, _>>()?;
            Ok(Self { pages })
        } else {
            tracing::debug!("Loading single-page document from {}", path.display());
            Ok(Self {
                pages: vec![read_page(path)?],
            })
        }
    }

    /// Reads a single-page document from a reader, such as stdin.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader fails or yields invalid UTF-8.
    pub fn read(mut reader: impl Read) -> Result<Self, LoadError> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|source| LoadError::Io {
                path: PathBuf::from("-"),
                source,
            })?;
        Ok(Self { pages: vec![text] })
    }

    /// Appends the pages of another document.
    pub fn append(&mut self, other: Self) {
        self.pages.extend(other.pages);
    }

    /// The pages, in order.
    #[must_use]
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    /// The full text, pages separated by a blank line.
    #[must_use]
    pub fn text(&self) -> String {
        self.pages.join(PAGE_SEPARATOR)
    }
}

fn read_page(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn collect_page_paths(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension() == Some(OsStr::new(PAGE_EXTENSION)))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_is_a_single_page() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("contract.txt");
        fs::write(&path, "Monthly payment $300.").unwrap();

        let document = Document::load(&path).unwrap();
        assert_eq!(document.pages(), ["Monthly payment $300."]);
    }

    #[test]
    fn directory_pages_are_sorted_and_filtered() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("page-02.txt"), "second").unwrap();
        fs::write(tmp.path().join("page-01.txt"), "first").unwrap();
        fs::write(tmp.path().join("notes.md"), "ignored").unwrap();
        fs::create_dir(tmp.path().join("page-03")).unwrap();
        fs::write(tmp.path().join("page-03").join("a.txt"), "third").unwrap();

        let document = Document::load(tmp.path()).unwrap();
        assert_eq!(document.pages(), ["first", "second", "third"]);
        assert_eq!(document.text(), "first\n\nsecond\n\nthird");
    }

    #[test]
    fn directory_without_pages_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("notes.md"), "ignored").unwrap();

        assert!(matches!(
            Document::load(tmp.path()),
            Err(LoadError::NoPages(_))
        ));
    }

    #[test]
    fn missing_path_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.txt");

        let error = Document::load(&missing).unwrap_err();
        assert!(matches!(error, LoadError::NotFound(_)));
        assert!(error.to_string().contains("missing.txt"));
    }

    #[test]
    fn reader_is_a_single_page() {
        let document = Document::read("line one\nline two".as_bytes()).unwrap();
        assert_eq!(document.pages().len(), 1);
        assert_eq!(document.text(), "line one\nline two");
    }

    #[test]
    fn append_keeps_page_order() {
        let mut document = Document::from_pages(vec!["a".to_string()]);
        document.append(Document::from_pages(vec!["b".to_string(), "c".to_string()]));
        assert_eq!(document.pages(), ["a", "b", "c"]);
    }
}
