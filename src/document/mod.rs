mod statement;

pub use statement::*;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::utils::{indent_of, leading_whitespace};

/// A single line of an FRR config file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    /// 1-based line number
    pub number: usize,
    pub text: String,
}

impl Line {
    pub fn indent(&self) -> usize {
        indent_of(&self.text)
    }

    pub fn leading_whitespace(&self) -> &str {
        leading_whitespace(&self.text)
    }

    pub fn statement(&self) -> Statement {
        Statement::parse(&self.text)
    }
}

/// Line-oriented view of an FRR config file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigDocument {
    path: Option<PathBuf>,
    lines: Vec<Line>,
    trailing_newline: bool,
    /// Lines end with `\r\n`, going by the first line terminator
    crlf: bool,
}

impl ConfigDocument {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|err| Error::on_read(path.to_path_buf(), err))?;
        let mut document = Self::from_text(&contents);
        debug!("Read {} lines from {}", document.len(), path.display());
        document.path = Some(path.to_path_buf());
        Ok(document)
    }

    pub fn from_text(text: &str) -> Self {
        let lines = text
            .lines()
            .enumerate()
            .map(|(i, text)| Line {
                number: i + 1,
                text: text.to_string(),
            })
            .collect();
        Self {
            path: None,
            lines,
            trailing_newline: text.ends_with('\n'),
            crlf: text
                .find('\n')
                .map_or(false, |end| text[..end].ends_with('\r')),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Case-sensitive substring search over every line
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.text.contains(needle))
    }

    /// Insert new lines after the given (0-based) line indexes
    ///
    /// Anchors refer to the document before any insertion; lines sharing an
    /// anchor keep their order. Anchors past the end are appended.
    pub fn insert_after(&mut self, mut insertions: BTreeMap<usize, Vec<String>>) {
        if insertions.is_empty() {
            return;
        }
        let added: usize = insertions.values().map(|lines| lines.len()).sum();
        let mut texts: Vec<String> = Vec::with_capacity(self.lines.len() + added);
        for (i, line) in self.lines.drain(..).enumerate() {
            texts.push(line.text);
            if let Some(new_lines) = insertions.remove(&i) {
                texts.extend(new_lines);
            }
        }
        for (_, new_lines) in insertions {
            texts.extend(new_lines);
        }
        self.lines = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Line { number: i + 1, text })
            .collect();
        debug!("Inserted {} lines", added);
    }

    /// Contents as they would be written back to disk
    pub fn render(&self) -> String {
        let terminator = if self.crlf { "\r\n" } else { "\n" };
        let mut output = self
            .lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join(terminator);
        if self.trailing_newline && !self.lines.is_empty() {
            output.push_str(terminator);
        }
        output
    }
}

impl fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
