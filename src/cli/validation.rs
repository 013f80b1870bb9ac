use crate::cli::args::{CliArgs, Command};

/// Syntax checks that do not need the backend or the form. Field values
/// are left to the form validators so their messages match the page.
pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid --timeout, expected a positive number of seconds".to_string());
        }
    }
    if let Some(server) = args.server.as_deref() {
        crate::client::normalize_base_url(server)
            .map_err(|e| format!("invalid --server '{server}': {e}"))?;
    }

    match args.command.as_ref() {
        Some(Command::Sample(sample)) => {
            for raw in sample.items.iter() {
                crate::utils::parse_item_spec(raw)
                    .map_err(|e| format!("invalid --item '{raw}': {e}"))?;
            }
        }
        Some(Command::Patterns(patterns)) => {
            if let Some(raw) = patterns.ids.as_deref() {
                crate::utils::parse_ids_csv(raw)
                    .map_err(|e| format!("invalid --ids '{raw}': {e}"))?;
            }
            if let Some(raw) = patterns.sort.as_deref() {
                crate::utils::parse_sort_spec(raw)
                    .map_err(|e| format!("invalid --sort '{raw}': {e}"))?;
            }
            if let Some(raw) = patterns.export_format.as_deref() {
                if crate::output::ExportFormat::parse(raw).is_none() {
                    return Err(format!(
                        "invalid --export-format '{raw}', expected spreadsheet, csv, json, html or text"
                    ));
                }
            }
        }
        Some(Command::Delete(delete)) => {
            if delete.ids.iter().any(|id| id.trim().is_empty()) {
                return Err("sample id must not be empty".to_string());
            }
        }
        Some(Command::InitConfig) | None => {}
    }
    Ok(())
}
