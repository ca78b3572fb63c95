//! States processing the header text into raw sections.
//!
//! A header is a sequence of lines. A line starting with `:` is a section
//! marker, whose key is the marker with surrounding colons removed, in lower
//! case. Most sections are scalar: the next line is the value. The
//! [`TABLE_SECTIONS`] instead own every following tab-indented line, the first
//! of which names the columns.
//!
//! ```text
//! :SCAN_PIXELS:
//!        256       256
//! :DATA_INFO:
//! 	Channel	Name	Unit	Direction	Calibration	Offset
//! 	14	Z	m	both	-1.000E-9	0.000E+0
//! ```

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

use super::header::Table;

/// Sections holding a tab-separated table rather than a single value.
pub const TABLE_SECTIONS: [&str; 2] = ["data_info", "z-controller"];

/// Lines at the end of the header text (blank lines and the end-tag line)
/// which never hold a section.
pub const TRAILER_LINES: usize = 3;

/// The value of a section before type coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Raw {
    Value(String),
    Table(Table),
}

/// Raw sections, by key, in header order. Repeated keys keep the last value.
pub type Sections = IndexMap<String, Raw>;

/// A violation of the header grammar.
#[derive(Debug, Error, PartialEq)]
pub enum GrammarError {
    /// A scalar section marker ended the header.
    #[error("Section {section} has no value line.")]
    MissingValue { section: String },
    /// A table section had no column header row.
    #[error("Table {section} has no column header row.")]
    EmptyTable { section: String },
    /// A table row has a different number of cells to the column header row.
    #[error("Table {section} row {row} has {found} columns, expected {expected}.")]
    RaggedTable {
        section: String,
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl GrammarError {
    /// The key of the offending section.
    pub fn section(&self) -> &str {
        match self {
            Self::MissingValue { section }
            | Self::EmptyTable { section }
            | Self::RaggedTable { section, .. } => section,
        }
    }
}

#[derive(Debug)]
enum State {
    /// Between sections; unclaimed lines are skipped.
    Idle,
    /// After a scalar section marker, awaiting its value line.
    Scalar(String),
    /// Inside a table section, collecting its rows.
    Table(String, Vec<Vec<String>>),
}

/// Line-driven state machine for the header grammar.
#[derive(Debug)]
pub struct Grammar {
    state: State,
    sections: Sections,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            sections: Sections::new(),
        }
    }

    /// Transition to another state by consuming a line, without its newline.
    pub fn advance(mut self, line: &str) -> Result<Self, GrammarError> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let marker = line.starts_with(':');

        self.state = match self.state {
            State::Idle if marker => open(line),
            State::Idle => State::Idle,

            // A marker cannot be a value: the pending section is left empty.
            State::Scalar(key) if marker => {
                self.sections.insert(key, Raw::Value(String::new()));
                open(line)
            }
            State::Scalar(key) => {
                self.sections.insert(key, Raw::Value(line.trim().to_string()));
                State::Idle
            }

            State::Table(key, mut rows) if line.starts_with('\t') => {
                rows.push(line.trim_matches('\t').split('\t').map(String::from).collect());
                State::Table(key, rows)
            }
            State::Table(key, rows) => {
                let table = close(&key, rows)?;
                self.sections.insert(key, Raw::Table(table));

                if marker { open(line) } else { State::Idle }
            }
        };

        Ok(self)
    }

    /// End the header, returning all sections.
    pub fn finish(mut self) -> Result<Sections, GrammarError> {
        match self.state {
            State::Idle => {}
            State::Scalar(section) => return Err(GrammarError::MissingValue { section }),
            State::Table(key, rows) => {
                let table = close(&key, rows)?;
                self.sections.insert(key, Raw::Table(table));
            }
        }

        Ok(self.sections)
    }
}

fn open(marker: &str) -> State {
    let key = marker.trim().trim_matches(':').to_lowercase();

    if TABLE_SECTIONS.contains(&key.as_str()) {
        State::Table(key, Vec::new())
    } else {
        State::Scalar(key)
    }
}

fn close(key: &str, rows: Vec<Vec<String>>) -> Result<Table, GrammarError> {
    let mut rows = rows.into_iter();

    let Some(names) = rows.next() else {
        return Err(GrammarError::EmptyTable {
            section: key.to_string(),
        });
    };

    let rows = rows.collect::<Vec<_>>();

    for (i, row) in rows.iter().enumerate() {
        if row.len() != names.len() {
            Err(GrammarError::RaggedTable {
                section: key.to_string(),
                row: i + 1,
                expected: names.len(),
                found: row.len(),
            })?;
        }
    }

    Ok(Table::new(names, rows))
}

/// Parse header text into raw sections, ignoring the trailing lines.
pub fn parse(text: &str) -> Result<Sections, GrammarError> {
    let lines = text.split('\n').collect::<Vec<_>>();
    let lines = &lines[..lines.len().saturating_sub(TRAILER_LINES)];

    let sections = lines
        .iter()
        .try_fold(Grammar::new(), |grammar, line| grammar.advance(line))?
        .finish()?;

    debug!("Parsed {} header sections", sections.len());

    Ok(sections)
}
