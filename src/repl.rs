//! Line-oriented session over the pattern search page.

use std::io::Write;
use std::path::PathBuf;

use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::client::Backend;
use crate::controller::{self, FilterSlot, Page, PatternController, SubmitOutcome};
use crate::form::{LIFT, MINCONF, MINSUP};
use crate::output::{self, ExportFormat};
use crate::utils;

pub const HELP: &str = "\
commands:
  set <field> <value>          change a search field (antecedent, antecedent_max,
                               consequent, consequent_max, minsup, minconf, lift)
  select <id> / deselect <id>  tick or untick a saved sample
  selected                     list ticked samples in selection order
  samples                      list saved samples
  submit                       run the pattern search
  filter <antecedent|consequent> [expr]
                               set a column filter; '~' negates, '&' joins terms
  sort <column> [asc|desc]     sort patterns by column name or index
  show [patterns|quartiles|deciles|form]
  quantiles                    show or hide the quartile and decile tables
  export [path]                write the patterns table (default data.xlsx)
  delete <id>                  delete a saved sample
  help                         this text
  quit                         leave the session";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowTarget {
    Patterns,
    Quartiles,
    Deciles,
    Form,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Set { field: String, value: String },
    Select(String),
    Deselect(String),
    Selected,
    Samples,
    Submit,
    Filter { slot: FilterSlot, text: String },
    Sort { column: String, ascending: bool },
    Show(ShowTarget),
    Quantiles,
    Export(Option<String>),
    Delete(String),
    Help,
    Quit,
}

fn one_arg(name: &str, rest: &str) -> Result<String, String> {
    let arg = rest.trim();
    if arg.is_empty() || arg.contains(char::is_whitespace) {
        return Err(format!("usage: {name} <id>"));
    }
    Ok(arg.to_string())
}

impl Command {
    /// `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let cmd = match verb.to_lowercase().as_str() {
            "set" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| "usage: set <field> <value>".to_string())?;
                Command::Set {
                    field: field.to_string(),
                    value: value.trim().to_string(),
                }
            }
            "select" => Command::Select(one_arg("select", rest)?),
            "deselect" => Command::Deselect(one_arg("deselect", rest)?),
            "selected" => Command::Selected,
            "samples" => Command::Samples,
            "submit" | "search" => Command::Submit,
            "filter" => {
                let (slot, text) = match rest.split_once(char::is_whitespace) {
                    Some((slot, text)) => (slot, text.trim()),
                    None => (rest, ""),
                };
                let slot = FilterSlot::parse(slot)
                    .ok_or_else(|| "usage: filter <antecedent|consequent> [expr]".to_string())?;
                Command::Filter {
                    slot,
                    text: text.to_string(),
                }
            }
            "sort" => {
                let spec = rest.split_whitespace().collect::<Vec<_>>().join(":");
                let (column, ascending) = utils::parse_sort_spec(&spec)
                    .map_err(|_| "usage: sort <column> [asc|desc]".to_string())?;
                Command::Sort { column, ascending }
            }
            "show" => Command::Show(match rest.to_lowercase().as_str() {
                "" | "patterns" => ShowTarget::Patterns,
                "quartiles" => ShowTarget::Quartiles,
                "deciles" => ShowTarget::Deciles,
                "form" => ShowTarget::Form,
                other => return Err(format!("nothing called '{other}' to show")),
            }),
            "quantiles" | "toggle" => Command::Quantiles,
            "export" | "download" => {
                Command::Export((!rest.is_empty()).then(|| rest.to_string()))
            }
            "delete" => Command::Delete(one_arg("delete", rest)?),
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("unknown command '{other}', try 'help'")),
        };
        Ok(Some(cmd))
    }
}

/// One search page and the backend it talks to.
pub struct Session<'a, B: Backend> {
    pub page: Page,
    pub controller: PatternController,
    backend: &'a B,
    export_path: String,
}

impl<'a, B: Backend> Session<'a, B> {
    pub fn new(page: Page, controller: PatternController, backend: &'a B) -> Self {
        Self {
            page,
            controller,
            backend,
            export_path: output::DEFAULT_EXPORT_FILE.to_string(),
        }
    }

    pub fn with_export_path(mut self, path: impl Into<String>) -> Self {
        self.export_path = path.into();
        self
    }

    fn banner_text(&self) -> String {
        self.page.banner.message().unwrap_or_default().to_string()
    }

    pub fn render_patterns(&self) -> String {
        let view = &self.page.patterns;
        if !view.is_results_visible() {
            return "no results yet, run 'submit'".to_string();
        }
        let table = view.patterns();
        let mut out = String::new();
        if let Some(title) = view.title() {
            out.push_str(title);
            out.push('\n');
        }
        out.push_str(&output::render_text(table, true));
        out.push_str(&format!(
            "({} of {} rows shown)",
            table.visible_count(),
            table.row_count()
        ));
        out
    }

    fn render_form(&self) -> String {
        let form = &self.controller.form.form;
        form.numbers()
            .iter()
            .map(|f| {
                let marker = if form.is_marked(&f.id) { " !" } else { "" };
                format!(
                    "{:<15} {:<8} [{} .. {}]{marker}  {}",
                    f.id,
                    f.value,
                    utils::format_number(f.min),
                    utils::format_number(f.max),
                    f.label
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Runs one command and returns the text to print.
    pub async fn execute(&mut self, cmd: Command) -> Result<String, String> {
        match cmd {
            Command::Set { field, value } => {
                let form = &mut self.controller.form.form;
                if !form.set_value(&field, value.as_str()) {
                    return Err(format!("unknown field '{field}'"));
                }
                let allow_float = [MINSUP, MINCONF, LIFT].contains(&field.as_str());
                if form.validate_number_field(&field, allow_float, &mut self.page.banner) {
                    Ok(format!("{field} = {value}"))
                } else {
                    Err(self.banner_text())
                }
            }
            Command::Select(id) => {
                self.page.toggle_selection(&id, true);
                Ok(format!("selected: {}", self.page.selection.ids().join(", ")))
            }
            Command::Deselect(id) => {
                self.page.toggle_selection(&id, false);
                Ok(format!("selected: {}", self.page.selection.ids().join(", ")))
            }
            Command::Selected => Ok(format!("selected: {}", self.page.selection.ids().join(", "))),
            Command::Samples => Ok(self
                .page
                .samples
                .ids()
                .iter()
                .map(|id| {
                    let mark = if self.page.selection.contains(id) { "[x]" } else { "[ ]" };
                    format!("{mark} {id}")
                })
                .collect::<Vec<_>>()
                .join("\n")),
            Command::Submit => {
                match self.controller.submit(&mut self.page, self.backend).await {
                    SubmitOutcome::Completed => Ok(self.render_patterns()),
                    SubmitOutcome::Invalid => Err(self.banner_text()),
                    SubmitOutcome::Rejected(message) => Err(message),
                }
            }
            Command::Filter { slot, text } => {
                let shown = self.page.patterns.set_filter(slot, &text);
                Ok(format!(
                    "{shown} of {} rows shown",
                    self.page.patterns.patterns().row_count()
                ))
            }
            Command::Sort { column, ascending } => {
                let col = self
                    .page
                    .patterns
                    .column_index(&column)
                    .ok_or_else(|| format!("no column '{column}'"))?;
                if !self.page.patterns.sort(col, ascending) {
                    return Err(format!("no column '{column}'"));
                }
                Ok(self.render_patterns())
            }
            Command::Show(ShowTarget::Patterns) => Ok(self.render_patterns()),
            Command::Show(ShowTarget::Quartiles) => {
                Ok(output::render_text(self.page.patterns.quartiles(), false))
            }
            Command::Show(ShowTarget::Deciles) => {
                Ok(output::render_text(self.page.patterns.deciles(), false))
            }
            Command::Show(ShowTarget::Form) => Ok(self.render_form()),
            Command::Quantiles => {
                let view = &mut self.page.patterns;
                if !view.is_quantiles_visible() {
                    return Err("no quantile tables yet, run 'submit'".to_string());
                }
                view.toggle_quantiles();
                let mut out = format!("{} {}", view.toggle_icon(), view.toggle_text());
                if view.is_quantiles_expanded() {
                    for table in [view.quartiles(), view.deciles()] {
                        if !table.is_empty() {
                            out.push('\n');
                            out.push_str(&output::render_text(table, false));
                        }
                    }
                }
                Ok(out)
            }
            Command::Export(path) => {
                if !self.page.patterns.is_results_visible() {
                    return Err("nothing to export, run 'submit'".to_string());
                }
                let path = PathBuf::from(path.unwrap_or_else(|| self.export_path.clone()));
                let format = output::export_table(self.page.patterns.patterns(), &path, None, false)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(format!("wrote {} ({})", path.display(), format_name(format)))
            }
            Command::Delete(id) => {
                if controller::delete_sample(&mut self.page, self.backend, &id).await {
                    Ok(format!("deleted sample {id}"))
                } else {
                    Err(format!("could not delete sample {id}, see log"))
                }
            }
            Command::Help => Ok(HELP.to_string()),
            Command::Quit => Ok(String::new()),
        }
    }
}

pub fn format_name(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Csv => "csv",
        ExportFormat::Json => "json",
        ExportFormat::Spreadsheet => "spreadsheet",
        ExportFormat::Html => "html",
        ExportFormat::Text => "text",
    }
}

fn prompt() {
    print!("patterns> ");
    let _ = std::io::stdout().flush();
}

/// Reads commands from stdin until `quit` or end of input.
pub async fn run<B: Backend>(session: &mut Session<'_, B>) -> Result<(), String> {
    println!("{}", "type 'help' for commands".dimmed());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| format!("failed to read input: {e}"))?
    {
        match Command::parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => break,
            Ok(Some(cmd)) => match session.execute(cmd).await {
                Ok(text) if text.is_empty() => {}
                Ok(text) => println!("{text}"),
                Err(text) => println!("{}", text.red()),
            },
            Err(e) => println!("{}", e.yellow()),
        }
        prompt();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::PatternsResponse;
    use crate::controller::fake::FakeBackend;
    use crate::controller::pattern::MIN_ABOVE_MAX;
    use crate::form::pattern::PatternForm;
    use crate::table::PatternRow;
    use serde_json::json;

    fn backend() -> FakeBackend {
        FakeBackend::default().with_patterns(PatternsResponse {
            patterns: Some(vec![
                PatternRow {
                    antecedents: json!("(forks_q4)"),
                    consequents: json!("(watches_q4)"),
                    support: json!(0.3),
                    confidence: json!(0.8),
                    lift: json!(1.2),
                },
                PatternRow {
                    antecedents: json!("(issues_q1)"),
                    consequents: json!("(forks_q1)"),
                    support: json!(0.1),
                    confidence: json!(0.6),
                    lift: json!(2.5),
                },
            ]),
            quartiles: Some(serde_json::from_value(json!([{"name": "forks", "Q1": 1}])).unwrap()),
            deciles: None,
        })
    }

    async fn run_lines<B: Backend>(session: &mut Session<'_, B>, lines: &[&str]) -> Vec<Result<String, String>> {
        let mut out = Vec::new();
        for line in lines {
            let cmd = Command::parse(line).unwrap().unwrap();
            out.push(session.execute(cmd).await);
        }
        out
    }

    #[test]
    fn parses_commands_with_free_text() {
        assert_eq!(
            Command::parse("filter antecedent ~forks & issues").unwrap(),
            Some(Command::Filter {
                slot: FilterSlot::Antecedent,
                text: "~forks & issues".to_string()
            })
        );
        assert_eq!(
            Command::parse("sort Лифт desc").unwrap(),
            Some(Command::Sort {
                column: "Лифт".to_string(),
                ascending: false
            })
        );
        assert_eq!(
            Command::parse("filter consequent").unwrap(),
            Some(Command::Filter {
                slot: FilterSlot::Consequent,
                text: String::new()
            })
        );
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert!(Command::parse("select").is_err());
        assert!(Command::parse("frobnicate").is_err());
    }

    #[tokio::test]
    async fn search_filter_and_sort_flow() {
        let backend = backend();
        let mut session = Session::new(
            Page::default(),
            PatternController::new(PatternForm::with_defaults()),
            &backend,
        );

        let out = run_lines(
            &mut session,
            &["select 4", "submit", "filter consequent forks", "sort lift desc"],
        )
        .await;
        assert!(out[1].as_ref().unwrap().contains("Найдено 2 шаблона:"));
        assert_eq!(out[2].as_ref().unwrap(), "1 of 2 rows shown");
        let sorted = out[3].as_ref().unwrap();
        assert!(sorted.contains("(issues_q1)"));
        assert!(!sorted.contains("(forks_q4)"));
        assert_eq!(backend.queries()[0].ids, vec!["4"]);
    }

    #[tokio::test]
    async fn set_validates_immediately() {
        let backend = backend();
        let mut session = Session::new(
            Page::default(),
            PatternController::new(PatternForm::with_defaults()),
            &backend,
        );
        let out = run_lines(&mut session, &["set antecedent 2", "set antecedent_max 1", "select 1", "submit"]).await;
        assert!(out[0].is_ok());
        assert_eq!(out[3], Err(MIN_ABOVE_MAX.to_string()));
        assert!(backend.calls().is_empty());

        let out = run_lines(&mut session, &["set minsup 2"]).await;
        assert!(out[0].as_ref().unwrap_err().contains("Текущее значение: 2"));
    }

    #[tokio::test]
    async fn quantile_toggle_needs_results() {
        let backend = backend();
        let mut session = Session::new(
            Page::default(),
            PatternController::new(PatternForm::with_defaults()),
            &backend,
        );
        assert!(run_lines(&mut session, &["quantiles"]).await[0].is_err());
        let out = run_lines(&mut session, &["select 1", "submit", "quantiles", "quantiles"]).await;
        let expanded = out[2].as_ref().unwrap();
        assert!(expanded.starts_with("▼ Скрыть таблицу квартилей и децилей"));
        assert!(expanded.contains("forks"));
        assert_eq!(out[3].as_ref().unwrap(), "⯈ Показать таблицу квартилей и децилей");
    }

    #[tokio::test]
    async fn export_writes_default_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.csv");
        let backend = backend();
        let mut session = Session::new(
            Page::default(),
            PatternController::new(PatternForm::with_defaults()),
            &backend,
        )
        .with_export_path(path.display().to_string());

        let out = run_lines(&mut session, &["select 1", "submit", "export"]).await;
        assert!(out[2].as_ref().unwrap().ends_with("(csv)"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("(forks_q4)"));
    }
}
