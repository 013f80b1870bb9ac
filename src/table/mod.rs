//! Shape-agnostic result tables.
//!
//! A [`ResultTable`] keeps the typed row values it was rendered from next to
//! the rendered cells. Filtering only flips row visibility and sorting only
//! reorders rows, so neither ever changes a cell's text.

pub mod filter;
pub mod sort;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils;

pub use filter::{validate_filter, ColumnFilter};

/// One backend row: column name to scalar, in the order the backend sent it.
pub type Row = serde_json::Map<String, Value>;

pub const PATTERN_HEADERS: [&str; 5] = [
    "Антецедент",
    "Консеквент",
    "Поддержка",
    "Достоверность",
    "Лифт",
];

/// One association rule as returned by `/find-patterns-submit`. The fields
/// are display values; the backend decides their formatting.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternRow {
    #[serde(default)]
    pub antecedents: Value,
    #[serde(default)]
    pub consequents: Value,
    #[serde(default)]
    pub support: Value,
    #[serde(default)]
    pub confidence: Value,
    #[serde(default)]
    pub lift: Value,
}

impl PatternRow {
    fn values(&self) -> Vec<Value> {
        vec![
            self.antecedents.clone(),
            self.consequents.clone(),
            self.support.clone(),
            self.confidence.clone(),
            self.lift.clone(),
        ]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub align: Align,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<Cell>,
    pub visible: bool,
    source: usize,
}

impl TableRow {
    pub fn texts(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.text.as_str()).collect()
    }
}

/// Text a value shows up as once it is put into a cell.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                n.to_string()
            } else {
                n.as_f64().map(utils::format_number).unwrap_or_default()
            }
        }
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultTable {
    header: Vec<Cell>,
    rows: Vec<TableRow>,
    data: Vec<Vec<Value>>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with a fixed header, as the patterns table ships with one.
    pub fn with_header(labels: &[&str]) -> Self {
        Self {
            header: labels
                .iter()
                .map(|l| Cell {
                    text: l.to_string(),
                    align: Align::Left,
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Renders rows of any shape. Columns come from the first row's keys in
    /// their original order; every row is laid out in that column order.
    ///
    /// An empty input clears the body and leaves the previous header alone.
    pub fn render(&mut self, rows: &[Row]) {
        self.clear_body();
        let Some(first) = rows.first() else {
            return;
        };

        let columns: Vec<String> = first.keys().cloned().collect();
        self.header = columns
            .iter()
            .map(|c| Cell {
                text: c.clone(),
                align: Align::Center,
            })
            .collect();

        for row in rows {
            let values: Vec<Value> = columns
                .iter()
                .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                .collect();
            let cells = values
                .iter()
                .enumerate()
                .map(|(i, v)| Cell {
                    text: value_text(v),
                    align: if i == 0 { Align::Center } else { Align::Right },
                })
                .collect();
            self.push_row(cells, values);
        }
    }

    /// Replaces the body with pattern rows, keeping the fixed header.
    pub fn render_patterns(&mut self, patterns: &[PatternRow]) {
        self.clear_body();
        if self.header.is_empty() {
            *self = Self::with_header(&PATTERN_HEADERS);
        }
        for pattern in patterns {
            let values = pattern.values();
            let cells = values
                .iter()
                .map(|v| Cell {
                    text: value_text(v),
                    align: Align::Left,
                })
                .collect();
            self.push_row(cells, values);
        }
    }

    fn push_row(&mut self, cells: Vec<Cell>, values: Vec<Value>) {
        let source = self.data.len();
        self.data.push(values);
        self.rows.push(TableRow {
            cells,
            visible: true,
            source,
        });
    }

    pub fn clear_body(&mut self) {
        self.rows.clear();
        self.data.clear();
    }

    pub fn header(&self) -> &[Cell] {
        &self.header
    }

    pub fn header_texts(&self) -> Vec<&str> {
        self.header.iter().map(|c| c.text.as_str()).collect()
    }

    /// Body rows in display order, hidden ones included.
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.iter().filter(|r| r.visible)
    }

    pub fn visible_count(&self) -> usize {
        self.visible_rows().count()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// The typed value behind a displayed cell.
    pub fn value(&self, row: &TableRow, col: usize) -> Option<&Value> {
        self.data.get(row.source).and_then(|values| values.get(col))
    }

    /// Resolves a column by header text (case-insensitive) or by index.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let needle = name.trim().to_lowercase();
        if let Some(idx) = self
            .header
            .iter()
            .position(|c| c.text.to_lowercase() == needle)
        {
            return Some(idx);
        }
        needle.parse::<usize>().ok().filter(|i| *i < self.column_count().max(self.widest_row()))
    }

    fn widest_row(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }

    /// Applies one filter per column slot, slot `i` to column `i`. Rows stay
    /// in the table; only their visibility changes. Returns the number of
    /// visible rows.
    pub fn apply_filters(&mut self, filters: &[&str]) -> usize {
        let parsed: Vec<ColumnFilter> = filters.iter().map(|f| ColumnFilter::parse(f)).collect();
        for row in self.rows.iter_mut() {
            row.visible = parsed
                .iter()
                .enumerate()
                .all(|(col, filter)| match row.cells.get(col) {
                    Some(cell) => filter.matches(&cell.text),
                    None => true,
                });
        }
        self.visible_count()
    }

    pub fn show_all(&mut self) {
        for row in self.rows.iter_mut() {
            row.visible = true;
        }
    }

    /// Stable numeric reorder of the body by column `col`. Returns `false`
    /// when the column does not exist.
    pub fn sort_by_column(&mut self, col: usize, ascending: bool) -> bool {
        if self.rows.iter().any(|r| col >= r.cells.len()) || (self.rows.is_empty() && col >= self.column_count()) {
            return false;
        }
        let data = &self.data;
        let key = |row: &TableRow| -> f64 {
            data.get(row.source)
                .and_then(|values| values.get(col))
                .map(sort::sort_key)
                .unwrap_or(0.0)
        };
        self.rows
            .sort_by(|a, b| sort::compare_keys(key(a), key(b), ascending));
        true
    }
}
