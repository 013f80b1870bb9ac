pub mod report;

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::table::{Align, ResultTable};

/// File the download button produces when no path is given.
pub const DEFAULT_EXPORT_FILE: &str = "data.xlsx";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Spreadsheet,
    Html,
    Text,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "xlsx" | "spreadsheet" | "excel" => Some(Self::Spreadsheet),
            "html" | "htm" => Some(Self::Html),
            "text" | "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<ExportFormat> {
    let lower = path.trim().to_lowercase();
    let ext = lower.rsplit_once('.').map(|(_, ext)| ext)?;
    if ext.contains('/') || ext.contains('\\') {
        return None;
    }
    ExportFormat::parse(ext)
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write csv: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },

    #[error("failed to build workbook: {source}")]
    Spreadsheet {
        #[source]
        source: XlsxError,
    },

    #[error("failed to serialize json: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Header and body text of a table, rows in display order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableSnapshot {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableSnapshot {
    pub fn capture(table: &ResultTable, visible_only: bool) -> Self {
        Self {
            headers: table.header_texts().iter().map(|s| s.to_string()).collect(),
            rows: table
                .rows()
                .iter()
                .filter(|r| r.visible || !visible_only)
                .map(|r| r.cells.iter().map(|c| c.text.clone()).collect())
                .collect(),
        }
    }
}

pub fn render_csv(snapshot: &TableSnapshot) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    writer
        .write_record(&snapshot.headers)
        .map_err(|e| ExportError::Csv { source: e })?;
    for row in snapshot.rows.iter() {
        writer
            .write_record(row)
            .map_err(|e| ExportError::Csv { source: e })?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Csv { source: e.into_error().into() })
}

/// One object per row keyed by header text, in header order.
pub fn render_json(snapshot: &TableSnapshot) -> Result<Vec<u8>, ExportError> {
    let records: Vec<serde_json::Map<String, serde_json::Value>> = snapshot
        .rows
        .iter()
        .map(|row| {
            snapshot
                .headers
                .iter()
                .zip(row.iter())
                .map(|(h, v)| (h.clone(), serde_json::Value::String(v.clone())))
                .collect()
        })
        .collect();
    let mut out =
        serde_json::to_vec_pretty(&records).map_err(|e| ExportError::Json { source: e })?;
    out.push(b'\n');
    Ok(out)
}

/// Single-sheet xlsx workbook with a bold header row. Cells that read as
/// plain numbers are written as numbers; comma decimals stay text.
pub fn render_spreadsheet(snapshot: &TableSnapshot) -> Result<Vec<u8>, ExportError> {
    let to_err = |source: XlsxError| ExportError::Spreadsheet { source };
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, header) in (0u16..).zip(snapshot.headers.iter()) {
        sheet
            .write_string_with_format(0, col, header, &bold)
            .map_err(to_err)?;
    }
    for (row, cells) in (1u32..).zip(snapshot.rows.iter()) {
        for (col, text) in (0u16..).zip(cells.iter()) {
            let number = text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite());
            match number {
                Some(value) => sheet.write_number(row, col, value).map_err(to_err)?,
                None => sheet.write_string(row, col, text).map_err(to_err)?,
            };
        }
    }

    workbook.save_to_buffer().map_err(to_err)
}

pub fn render_html(snapshot: &TableSnapshot, title: &str) -> Vec<u8> {
    report::render_html(snapshot, title)
}

fn pad(text: &str, width: usize, align: Align) -> String {
    let len = text.chars().count();
    let gap = width.saturating_sub(len);
    match align {
        Align::Left => format!("{text}{}", " ".repeat(gap)),
        Align::Right => format!("{}{text}", " ".repeat(gap)),
        Align::Center => {
            let left = gap / 2;
            format!("{}{text}{}", " ".repeat(left), " ".repeat(gap - left))
        }
    }
}

/// Column-aligned plain text rendering honoring each cell's alignment.
pub fn render_text(table: &ResultTable, visible_only: bool) -> String {
    let rows: Vec<_> = table
        .rows()
        .iter()
        .filter(|r| r.visible || !visible_only)
        .collect();

    let columns = rows
        .iter()
        .map(|r| r.cells.len())
        .chain(std::iter::once(table.column_count()))
        .max()
        .unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let mut widths = vec![0usize; columns];
    for (i, cell) in table.header().iter().enumerate() {
        widths[i] = widths[i].max(cell.text.chars().count());
    }
    for row in rows.iter() {
        for (i, cell) in row.cells.iter().enumerate() {
            widths[i] = widths[i].max(cell.text.chars().count());
        }
    }

    let mut out = String::new();
    if !table.header().is_empty() {
        let line: Vec<String> = table
            .header()
            .iter()
            .enumerate()
            .map(|(i, c)| pad(&c.text, widths[i], c.align))
            .collect();
        out.push_str(line.join(" | ").trim_end());
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("-+-"));
        out.push('\n');
    }
    for row in rows {
        let line: Vec<String> = row
            .cells
            .iter()
            .enumerate()
            .map(|(i, c)| pad(&c.text, widths[i], c.align))
            .collect();
        out.push_str(line.join(" | ").trim_end());
        out.push('\n');
    }
    out
}

/// Serializes `table` into `path`. The format comes from `format`, then the
/// file extension, then falls back to the spreadsheet workbook.
pub async fn export_table(
    table: &ResultTable,
    path: &Path,
    format: Option<ExportFormat>,
    visible_only: bool,
) -> Result<ExportFormat, ExportError> {
    let path_text = path.display().to_string();
    let format = format
        .or_else(|| infer_format_from_path(&path_text))
        .unwrap_or(ExportFormat::Spreadsheet);

    let snapshot = TableSnapshot::capture(table, visible_only);
    let rendered = match format {
        ExportFormat::Csv => render_csv(&snapshot)?,
        ExportFormat::Json => render_json(&snapshot)?,
        ExportFormat::Spreadsheet => render_spreadsheet(&snapshot)?,
        ExportFormat::Html => render_html(&snapshot, "Шаблоны"),
        ExportFormat::Text => render_text(table, visible_only).into_bytes(),
    };

    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| ExportError::Io {
            path: path_text.clone(),
            source: e,
        })?;
    outfile
        .write_all(&rendered)
        .await
        .map_err(|e| ExportError::Io {
            path: path_text.clone(),
            source: e,
        })?;
    outfile.flush().await.map_err(|e| ExportError::Io {
        path: path_text,
        source: e,
    })?;
    tracing::debug!(path = %path.display(), ?format, rows = snapshot.rows.len(), "table exported");
    Ok(format)
}
