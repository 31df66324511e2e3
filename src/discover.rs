use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StatementError;

const DOCUMENT_EXTENSION: &str = "pdf";

/// Asks the user for what could not be found on its own
pub trait Prompt {
    fn say(&mut self, line: &str) -> io::Result<()>;
    fn ask(&mut self, question: &str) -> io::Result<String>;
}

/// Prompt reading answers line by line
pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R, W> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompt for Terminal<R, W> {
    fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{line}")
    }

    fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer.trim().to_owned())
    }
}

/// PDF files of the directory, sorted by name
pub fn find_documents(directory: &Path) -> io::Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        let is_document = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case(DOCUMENT_EXTENSION));
        if is_document && path.is_file() {
            documents.push(path);
        }
    }
    documents.sort();
    Ok(documents)
}

/// Picks the statement to process
///
/// An explicit path wins. Otherwise the PDF files of `directory` are looked up: a single one
/// is used as is, several are offered for selection, and without any the user is asked for a
/// file name (relative to `directory`).
pub fn locate_input(
    explicit: Option<PathBuf>,
    directory: &Path,
    prompt: &mut impl Prompt,
) -> Result<PathBuf, StatementError> {
    let path = match explicit {
        Some(path) => path,
        None => choose_document(directory, prompt)?,
    };
    if path.is_file() {
        Ok(path)
    } else {
        Err(StatementError::InputNotFound(format!(
            "File '{}' not found",
            path.display()
        )))
    }
}

fn choose_document(
    directory: &Path,
    prompt: &mut impl Prompt,
) -> Result<PathBuf, StatementError> {
    let prompt_failed =
        |err: io::Error| StatementError::InputNotFound(format!("Could not read the answer: {err}"));

    let documents = find_documents(directory).map_err(|err| {
        StatementError::InputNotFound(format!("Could not list {}: {err}", directory.display()))
    })?;
    debug!(count = documents.len(), directory = %directory.display(), "Found documents");

    match documents.as_slice() {
        [] => {
            let answer = prompt.ask("Enter the PDF filename: ").map_err(prompt_failed)?;
            if answer.is_empty() {
                return Err(StatementError::InputNotFound(
                    "No file name was given".to_owned(),
                ));
            }
            Ok(directory.join(answer))
        }
        [document] => Ok(document.clone()),
        _ => {
            prompt.say("Found PDF files:").map_err(prompt_failed)?;
            for (i, document) in documents.iter().enumerate() {
                let name = document.file_name().unwrap_or(document.as_os_str());
                prompt
                    .say(&format!("{}. {}", i + 1, name.to_string_lossy()))
                    .map_err(prompt_failed)?;
            }
            let answer = prompt.ask("Select a file number: ").map_err(prompt_failed)?;
            answer
                .parse::<usize>()
                .ok()
                .and_then(|choice| choice.checked_sub(1))
                .and_then(|index| documents.get(index))
                .cloned()
                .ok_or_else(|| {
                    StatementError::InputNotFound(format!("'{answer}' is not a listed file number"))
                })
        }
    }
}
