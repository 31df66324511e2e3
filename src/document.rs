use std::fs;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::info;

use crate::error::StatementError;
use crate::extract::Page;

/// Extension of statements already converted to text (e.g. by `pdftotext`), with one form
/// feed between pages
const TEXT_EXTENSION: &str = "txt";
const PAGE_BREAK: char = '\x0c';

/// Serializes swaps of the process-wide panic hook
static PANIC_HOOK: Mutex<()> = Mutex::new(());

/// A statement file, read once into its pages of text rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
}

impl Document {
    pub fn open(path: &Path) -> Result<Self, StatementError> {
        if !path.is_file() {
            return Err(StatementError::InputNotFound(format!(
                "File '{}' not found",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_owned(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extracts the text of every page and splits it into rows
    ///
    /// The file is read in one go and closed before any text is extracted.
    pub fn pages(&self) -> Result<Vec<Page>, StatementError> {
        let bytes = fs::read(&self.path).map_err(|err| self.unreadable(err.to_string()))?;
        let texts = if self.is_text() {
            String::from_utf8_lossy(&bytes)
                .split(PAGE_BREAK)
                .map(str::to_owned)
                .collect()
        } else {
            extract_pdf_pages(&bytes).map_err(|reason| self.unreadable(reason))?
        };
        let pages: Vec<Page> = texts
            .iter()
            .map(|text| text.lines().map(str::to_owned).collect())
            .collect();
        info!(
            path = %self.path.display(),
            pages = pages.len(),
            rows = pages.iter().map(Vec::len).sum::<usize>(),
            "Extracted document"
        );
        Ok(pages)
    }

    fn is_text(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case(TEXT_EXTENSION))
    }

    fn unreadable(&self, reason: String) -> StatementError {
        StatementError::UnreadableDocument {
            path: self.path.clone(),
            reason,
        }
    }
}

/// `pdf-extract` panics on some documents it cannot handle, which is reported like any other
/// extraction failure
fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<String>, String> {
    quietly(|| pdf_extract::extract_text_from_mem_by_pages(bytes))?.map_err(|err| err.to_string())
}

/// Runs `f` with the panic hook silenced, turning a panic into its message
///
/// The installed hook (color-eyre's report) is put back afterwards.
fn quietly<T>(f: impl FnOnce() -> T + panic::UnwindSafe) -> Result<T, String> {
    let _guard = PANIC_HOOK.lock().unwrap_or_else(PoisonError::into_inner);
    let hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let result = panic::catch_unwind(f);
    panic::set_hook(hook);
    result.map_err(|payload| {
        payload
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .map_or_else(
                || "the PDF content could not be decoded".to_owned(),
                |message| format!("the PDF content could not be decoded: {message}"),
            )
    })
}
