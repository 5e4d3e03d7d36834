//! Tool results and their tabular text rendering.
//!
//! `ToolOutput` is the tagged outcome of running a query. Its rendered text is
//! what clients see as the query result; failures still render with the
//! legacy sentinel prefixes so text-only consumers can detect them.

use itertools::Itertools;
use std::collections::BTreeMap;

/// One result row: column name to rendered value
pub type Row = BTreeMap<String, String>;

pub const NO_RESULTS: &str = "No results found.";

pub const ERROR_SENTINELS: [&str; 3] = ["Error:", "Security Violation:", "Database Error:"];

/// Rows as returned by a backend, with column order preserved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QueryRows {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> Vec<Row> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected by the SQL safety validator
    Security,
    /// The backend reported an error while running the query
    Database,
    /// Anything else: unknown connection, timeout, bad arguments
    General,
}

impl FailureKind {
    pub fn sentinel(&self) -> &'static str {
        match self {
            FailureKind::Security => "Security Violation:",
            FailureKind::Database => "Database Error:",
            FailureKind::General => "Error:",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    Table(QueryRows),
    Empty,
    Failure { kind: FailureKind, message: String },
}

impl ToolOutput {
    pub fn from_rows(rows: QueryRows) -> Self {
        if rows.is_empty() {
            ToolOutput::Empty
        } else {
            ToolOutput::Table(rows)
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        ToolOutput::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ToolOutput::Failure { .. })
    }

    pub fn records(&self) -> Vec<Row> {
        match self {
            ToolOutput::Table(rows) => rows.records(),
            _ => Vec::new(),
        }
    }

    pub fn render(&self) -> String {
        match self {
            ToolOutput::Table(rows) => render_table(&rows.columns, &rows.rows),
            ToolOutput::Empty => NO_RESULTS.to_string(),
            ToolOutput::Failure { kind, message } => format!("{} {}", kind.sentinel(), message),
        }
    }
}

/// Fixed-width table: header, `-|-` separator, one line per row. Each column
/// is as wide as its longest cell or header.
pub fn render_table(columns: &[String], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .fold(header.chars().count(), usize::max)
        })
        .collect();

    let pad_line = |cells: &[String]| {
        widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                format!("{:<width$}", cell, width = *w)
            })
            .join(" | ")
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(pad_line(columns));
    lines.push(widths.iter().map(|w| "-".repeat(*w)).join("-|-"));
    for row in rows {
        lines.push(pad_line(row.as_slice()));
    }
    lines.join("\n")
}

/// True when rendered tool text carries one of the failure prefixes
pub fn contains_error_sentinel(text: &str) -> bool {
    ERROR_SENTINELS.iter().any(|s| text.contains(s))
}
