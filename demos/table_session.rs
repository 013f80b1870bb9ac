use patternscope::output::{self, ExportFormat};
use patternscope::table::{ResultTable, Row};
use std::error::Error;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let rows: Vec<Row> = serde_json::from_str(
        r#"[
            {"name": "forks", "Q1": 1, "Q2": 4, "Q3": 12},
            {"name": "pushes", "Q1": 10, "Q2": 80, "Q3": 250},
            {"name": "watches", "Q1": 3, "Q2": 15, "Q3": 90}
        ]"#,
    )?;

    let mut table = ResultTable::new();
    table.render(&rows);
    table.apply_filters(&["~watches"]);
    if let Some(col) = table.column_index("Q3") {
        table.sort_by_column(col, false);
    }
    print!("{}", output::render_text(&table, true));

    let written = output::export_table(
        &table,
        Path::new("quartiles.json"),
        Some(ExportFormat::Json),
        true,
    )
    .await?;
    println!("wrote quartiles.json ({written:?})");

    Ok(())
}
