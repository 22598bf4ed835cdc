//! Structured result sets produced by the data collector and consumed by
//! every format renderer.

use serde::{Deserialize, Serialize};

/// A single cell value. Floats render with one decimal place everywhere so
/// the same collected data looks identical across formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Cell {
        Cell::Text(value.into())
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Int(v) => write!(f, "{v}"),
            Cell::Float(v) => write!(f, "{v:.1}"),
        }
    }
}

/// One named table of the result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableGroup {
    /// Stable machine key, e.g. "users", "popular_tools".
    pub key: String,
    /// Sheet/section title, e.g. "User Details".
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// Summary groups hold a single aggregate row and render as a
    /// label/value block in the document format.
    pub summary: bool,
    /// The one group the flat-table renderer writes. Exactly one group per
    /// data set carries this flag.
    pub primary: bool,
}

impl TableGroup {
    pub fn new(key: impl Into<String>, title: impl Into<String>, columns: Vec<String>) -> Self {
        TableGroup {
            key: key.into(),
            title: title.into(),
            columns,
            rows: Vec::new(),
            summary: false,
            primary: false,
        }
    }

    pub fn summary(mut self) -> Self {
        self.summary = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }
}

/// The full structured result for one report: an ordered list of groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSet {
    pub groups: Vec<TableGroup>,
}

impl DataSet {
    pub fn new(groups: Vec<TableGroup>) -> Self {
        DataSet { groups }
    }

    /// The group the flat-table renderer flattens to. Falls back to the
    /// first group if no primary flag is set.
    pub fn primary_group(&self) -> Option<&TableGroup> {
        self.groups
            .iter()
            .find(|g| g.primary)
            .or_else(|| self.groups.first())
    }
}
