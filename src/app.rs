use std::collections::HashMap;
use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use itertools::Itertools;

use crate::cli::args::{CliArgs, Command, DeleteArgs, PatternArgs, SampleArgs};
use crate::cli::validation;
use crate::client::{ApiClient, ClientOptions};
use crate::config::{self, ConfigFile, FieldConfig};
use crate::controller::{
    self, FilterSlot, LoadingIndicator, Page, PatternController, SampleController, SampleList,
    SubmitOutcome,
};
use crate::form::pattern::{default_pattern_fields, PatternForm};
use crate::form::sample::{default_items, default_sample_fields, SampleForm, TransactionItem};
use crate::form::{dates, Form};
use crate::form::{
    ANTECEDENT, ANTECEDENT_MAX, CONSEQUENT, CONSEQUENT_MAX, END_DATE, LIFT, MINCONF, MINSUP,
    MIN_PARTICIPANTS, MIN_STARS, NUM_REPOS, START_DATE,
};
use crate::output::{self, ExportFormat};
use crate::repl;
use crate::utils;

const KNOWN_FIELDS: [&str; 10] = [
    MIN_PARTICIPANTS,
    MIN_STARS,
    NUM_REPOS,
    ANTECEDENT,
    ANTECEDENT_MAX,
    CONSEQUENT,
    CONSEQUENT_MAX,
    MINSUP,
    MINCONF,
    LIFT,
];

fn print_banner() {
    const BANNER: &str = r#"
                  __  __
    ____  ____ _/ /_/ /____  _________  _____________  ____  ___
   / __ \/ __ `/ __/ __/ _ \/ ___/ __ \/ ___/ ___/ __ \/ __ \/ _ \
  / /_/ / /_/ / /_/ /_/  __/ /  / / / (__  ) /__/ /_/ / /_/ /  __/
 / .___/\__,_/\__/\__/\___/_/  /_/ /_/____/\___/\____/ .___/\___/
/_/                                                 /_/
"#;
    print!("{}", BANNER.cyan());
    println!(
        "       v{} - association rule browser",
        env!("CARGO_PKG_VERSION")
    );
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn push_arg_sections<'a>(out: &mut String, args: impl Iterator<Item = &'a clap::Arg>) {
    let mut sections: Vec<(String, Vec<&clap::Arg>)> = Vec::new();
    let mut section_idx: HashMap<String, usize> = HashMap::new();

    for arg in args {
        if arg.is_hide_set() {
            continue;
        }

        let heading = arg.get_help_heading().unwrap_or("Options").to_string();

        let idx = match section_idx.get(&heading).copied() {
            Some(i) => i,
            None => {
                sections.push((heading.clone(), Vec::new()));
                let i = sections.len() - 1;
                section_idx.insert(heading, i);
                i
            }
        };

        sections[idx].1.push(arg);
    }

    for (heading, args) in sections {
        out.push_str(&heading);
        out.push_str(":\n");

        for arg in args {
            let mut parts: Vec<String> = Vec::new();

            if let Some(short) = arg.get_short() {
                parts.push(format!("-{short}"));
            }

            if let Some(long) = arg.get_long() {
                parts.push(format!("--{long}"));
            }

            if let Some(aliases) = arg.get_visible_aliases() {
                for alias in aliases {
                    let rendered = format!("--{alias}");
                    if !parts.iter().any(|p| p == &rendered) {
                        parts.push(rendered);
                    }
                }
            }

            let mut flags = if arg.is_positional() {
                let name = arg
                    .get_value_names()
                    .and_then(|names| names.first())
                    .map(|name| name.as_str())
                    .unwrap_or("VALUE");
                format!("<{name}>...")
            } else {
                parts.join(", ")
            };

            if !arg.is_positional() && arg.get_action().takes_values() {
                let value_name = arg
                    .get_value_names()
                    .and_then(|names| names.first())
                    .map(|name| name.as_str())
                    .unwrap_or("VALUE");
                flags.push(' ');
                flags.push('<');
                flags.push_str(value_name);
                flags.push('>');
            }

            out.push_str("  ");
            out.push_str(&flags);
            out.push('\n');

            if let Some(help) = arg.get_help() {
                let help = help.to_string();
                if !help.trim().is_empty() {
                    out.push_str("          ");
                    out.push_str(help.trim());
                    out.push('\n');
                }
            }

            out.push('\n');
        }
    }
}

/// Help grouped by heading. With `subcommand` set, renders that
/// subcommand's own options followed by the global ones.
pub fn render_custom_help(subcommand: Option<&str>) -> String {
    let root = CliArgs::command();
    let mut out = String::new();

    if let Some(version) = root.get_version() {
        out.push_str(root.get_name());
        out.push(' ');
        out.push_str(version);
        out.push('\n');
    } else {
        out.push_str(root.get_name());
        out.push('\n');
    }

    let sub = subcommand.and_then(|name| root.find_subcommand(name));
    match sub {
        Some(sub) => {
            if let Some(about) = sub.get_about() {
                out.push_str(&about.to_string());
                out.push('\n');
            }
            out.push('\n');
            out.push_str(&format!(
                "Usage: {} {} [OPTIONS]\n\n",
                root.get_name(),
                sub.get_name()
            ));
            let globals = root.get_arguments().filter(|a| a.is_global_set());
            push_arg_sections(&mut out, sub.get_arguments().chain(globals));
        }
        None => {
            if let Some(about) = root.get_about() {
                out.push_str(&about.to_string());
                out.push('\n');
            }
            if let Some(long_about) = root.get_long_about() {
                out.push('\n');
                out.push_str(&long_about.to_string());
                out.push('\n');
            }
            out.push('\n');
            out.push_str(&format!("Usage: {} [OPTIONS] <COMMAND>\n\n", root.get_name()));

            out.push_str("Commands:\n");
            for cmd in root.get_subcommands() {
                let about = cmd.get_about().map(|a| a.to_string()).unwrap_or_default();
                out.push_str(&format!("  {:<12}{}\n", cmd.get_name(), about));
            }
            out.push('\n');
            push_arg_sections(&mut out, root.get_arguments());
        }
    }

    out
}

fn help_target(argv: &[String]) -> Option<String> {
    let root = CliArgs::command();
    argv.iter().skip(1).find_map(|a| {
        root.get_subcommands()
            .find(|s| s.get_name() == a)
            .map(|s| s.get_name().to_string())
    })
}

#[derive(Clone, Debug)]
pub struct RunConfig {
    pub server_url: String,
    pub timeout_seconds: Option<u64>,
    pub proxy: Option<String>,
    pub no_color: bool,
    pub verbose: u8,
    pub is_new_repos: bool,
    pub export_path: String,
    pub fields: Option<std::collections::BTreeMap<String, FieldConfig>>,
    pub items: Vec<TransactionItem>,
    pub samples: Vec<String>,
}

impl RunConfig {
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.server_url.clone(),
            timeout_seconds: self.timeout_seconds,
            proxy: self.proxy.clone(),
        }
    }
}

/// CLI flags over config values over built-in defaults.
pub fn build_run_config(args: &CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(args)?;

    let server_url = args
        .server
        .clone()
        .or(cfg.server_url)
        .unwrap_or_else(|| config::DEFAULT_SERVER_URL.to_string());
    crate::client::normalize_base_url(&server_url)
        .map_err(|e| format!("invalid server url: {e}"))?;

    let timeout_seconds = args.timeout.or(cfg.timeout).filter(|t| *t > 0);
    let proxy = args
        .proxy
        .clone()
        .or(cfg.proxy)
        .filter(|p| !p.trim().is_empty());
    let no_color = args.no_color || cfg.no_color.unwrap_or(false);
    let verbose = if args.verbose > 0 {
        args.verbose
    } else {
        cfg.verbose.unwrap_or(0)
    };

    let items = match cfg.items {
        Some(items) if items.is_empty() => {
            return Err("config 'items' must list at least one transaction item".to_string())
        }
        Some(items) => items,
        None => default_items(),
    };
    let samples = cfg.samples.unwrap_or_default().into_iter().unique().collect();

    Ok(RunConfig {
        server_url,
        timeout_seconds,
        proxy,
        no_color,
        verbose,
        is_new_repos: cfg.is_new_repos.unwrap_or(false),
        export_path: cfg
            .export_path
            .unwrap_or_else(|| output::DEFAULT_EXPORT_FILE.to_string()),
        fields: cfg.fields,
        items,
        samples,
    })
}

fn set_if_given(form: &mut Form, id: &str, value: Option<&String>) {
    if let Some(value) = value {
        form.set_value(id, value.trim());
    }
}

pub fn build_sample_controller(
    run: &RunConfig,
    args: &SampleArgs,
    today: time::Date,
) -> Result<SampleController, String> {
    let fields = config::apply_field_overrides(default_sample_fields(), run.fields.as_ref());
    let mut form = SampleForm::new(today, fields, run.items.clone());

    set_if_given(&mut form.form, START_DATE, args.start_date.as_ref());
    set_if_given(&mut form.form, END_DATE, args.end_date.as_ref());
    set_if_given(&mut form.form, MIN_PARTICIPANTS, args.min_participants.as_ref());
    set_if_given(&mut form.form, MIN_STARS, args.min_stars.as_ref());
    set_if_given(&mut form.form, NUM_REPOS, args.num_repos.as_ref());
    form.is_new_repos = args.new_repos || run.is_new_repos;
    form.note = args.note.clone().unwrap_or_default();

    for raw in args.items.iter() {
        let (label, division) = utils::parse_item_spec(raw)?;
        if !form.set_item_checked(&label, true) {
            return Err(format!("unknown transaction item '{label}'"));
        }
        if let Some(division) = division {
            if !form.set_division(&label, division) {
                return Err(format!("item '{label}' is categorical and has no division"));
            }
        }
    }

    Ok(SampleController::new(form))
}

pub fn build_pattern_controller(
    run: &RunConfig,
    args: &PatternArgs,
) -> Result<(PatternController, Vec<String>), String> {
    let fields = config::apply_field_overrides(default_pattern_fields(), run.fields.as_ref());
    let mut form = PatternForm::new(fields);

    set_if_given(&mut form.form, ANTECEDENT, args.antecedent.as_ref());
    set_if_given(&mut form.form, ANTECEDENT_MAX, args.antecedent_max.as_ref());
    set_if_given(&mut form.form, CONSEQUENT, args.consequent.as_ref());
    set_if_given(&mut form.form, CONSEQUENT_MAX, args.consequent_max.as_ref());
    set_if_given(&mut form.form, MINSUP, args.minsup.as_ref());
    set_if_given(&mut form.form, MINCONF, args.minconf.as_ref());
    set_if_given(&mut form.form, LIFT, args.lift.as_ref());

    let mut ids: Vec<String> = Vec::new();
    if let Some(raw) = args.ids.as_deref() {
        ids.extend(utils::parse_ids_csv(raw)?);
    }
    ids.extend(args.id.iter().map(|id| id.trim().to_string()));
    let ids = ids.into_iter().filter(|id| !id.is_empty()).unique().collect();

    Ok((PatternController::new(form), ids))
}

fn loading_indicator() -> LoadingIndicator {
    if std::io::stderr().is_terminal() {
        LoadingIndicator::terminal()
    } else {
        LoadingIndicator::hidden()
    }
}

fn invalid_message(page: &Page, form: &Form) -> String {
    let banner = page.banner.message().unwrap_or_default().to_string();
    let marked = form.marked_ids();
    if marked.is_empty() {
        banner
    } else {
        format!("{banner} (fields: {})", marked.iter().join(", "))
    }
}

fn print_table(table: &crate::table::ResultTable, visible_only: bool) {
    let text = output::render_text(table, visible_only);
    let mut lines = text.lines();
    if let Some(header) = lines.next() {
        println!("{}", header.bold());
    }
    for line in lines {
        println!("{line}");
    }
}

async fn run_sample(run: RunConfig, args: SampleArgs) -> Result<(), String> {
    if args.list_items {
        for item in run.items.iter() {
            let division = item.division.map(|d| d.label()).unwrap_or("-");
            println!("{:<30} {}", item.label, division);
        }
        return Ok(());
    }

    let today = dates::today_local();
    let mut ctl = build_sample_controller(&run, &args, today)?;
    let client = ApiClient::new(&run.client_options()).map_err(|e| e.to_string())?;
    let mut page = Page::new(loading_indicator());

    format_kv_line("Server", client.base_url().as_str());
    format_kv_line(
        "Period",
        &format!(
            "{} .. {}",
            ctl.form.form.value(START_DATE).unwrap_or_default(),
            ctl.form.form.value(END_DATE).unwrap_or_default()
        ),
    );
    format_kv_line("Items", &ctl.form.selections().labels().join(", "));

    match ctl.submit(&mut page, &client).await {
        SubmitOutcome::Completed => {
            if let Some(text) = page.notification.message() {
                println!("{}", text.green());
            }
            Ok(())
        }
        SubmitOutcome::Invalid => Err(invalid_message(&page, &ctl.form.form)),
        SubmitOutcome::Rejected(message) => Err(message),
    }
}

async fn run_patterns(run: RunConfig, args: PatternArgs) -> Result<(), String> {
    let (ctl, ids) = build_pattern_controller(&run, &args)?;
    let client = ApiClient::new(&run.client_options()).map_err(|e| e.to_string())?;

    let mut page = Page::new(loading_indicator());
    page.samples = SampleList::new(run.samples.iter().cloned().chain(ids.iter().cloned()));
    for id in ids.iter() {
        page.toggle_selection(id, true);
    }
    if let Some(text) = args.filter_antecedent.as_deref() {
        page.patterns.set_filter(FilterSlot::Antecedent, text);
    }
    if let Some(text) = args.filter_consequent.as_deref() {
        page.patterns.set_filter(FilterSlot::Consequent, text);
    }

    let export_path = args.export.clone().unwrap_or_else(|| run.export_path.clone());
    let mut session = repl::Session::new(page, ctl, &client).with_export_path(export_path);

    if args.interactive {
        print_banner();
        format_kv_line("Server", client.base_url().as_str());
        format_kv_line("Selected", &session.page.selection.ids().iter().join(", "));
        return repl::run(&mut session).await;
    }

    match session.controller.submit(&mut session.page, &client).await {
        SubmitOutcome::Completed => {}
        SubmitOutcome::Invalid => {
            return Err(invalid_message(&session.page, &session.controller.form.form))
        }
        SubmitOutcome::Rejected(message) => return Err(message),
    }

    if let Some(spec) = args.sort.as_deref() {
        let (column, ascending) = utils::parse_sort_spec(spec)?;
        let col = session
            .page
            .patterns
            .column_index(&column)
            .ok_or_else(|| format!("no column '{column}' to sort by"))?;
        session.page.patterns.sort(col, ascending);
    }

    let view = &session.page.patterns;
    if let Some(title) = view.title() {
        println!("{}", title.green().bold());
    }
    print_table(view.patterns(), true);
    if !args.hide_quantiles {
        for (name, table) in [("Квартили", view.quartiles()), ("Децили", view.deciles())] {
            if table.is_empty() {
                continue;
            }
            println!();
            println!("{}", name.cyan().bold());
            print_table(table, false);
        }
    }

    if let Some(path) = args.export.as_deref() {
        let format = args.export_format.as_deref().and_then(ExportFormat::parse);
        let written = output::export_table(
            view.patterns(),
            &PathBuf::from(path),
            format,
            args.visible_only,
        )
        .await
        .map_err(|e| e.to_string())?;
        println!();
        format_kv_line("Exported", &format!("{path} ({})", repl::format_name(written)));
    }

    Ok(())
}

async fn run_delete(run: RunConfig, args: DeleteArgs) -> Result<(), String> {
    let client = ApiClient::new(&run.client_options()).map_err(|e| e.to_string())?;
    let mut page = Page::new(LoadingIndicator::hidden());
    page.samples = SampleList::new(args.ids.iter().cloned());

    let mut failed: Vec<String> = Vec::new();
    for id in args.ids.iter() {
        if controller::delete_sample(&mut page, &client, id).await {
            println!("{} {}", "deleted".green(), id);
        } else {
            failed.push(id.clone());
        }
    }
    if failed.is_empty() {
        Ok(())
    } else {
        Err(format!("failed to delete sample(s): {}", failed.iter().join(", ")))
    }
}

fn run_init_config(path: Option<PathBuf>) -> Result<(), String> {
    let path = path
        .or_else(config::default_config_path)
        .ok_or_else(|| "could not resolve a home directory for the config file".to_string())?;
    if config::ensure_default_config_file(&path)? {
        println!("{} {}", "created".green(), path.display());
    } else {
        println!("{} already exists", path.display());
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let argv: Vec<String> = std::env::args().collect();
    let args = match CliArgs::try_parse_from(&argv) {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                print!("{}", render_custom_help(help_target(&argv).as_deref()));
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let user_config_path = args.config.as_deref().map(config::expand_tilde);
    let command = match args.command.clone() {
        Some(command) => command,
        None => {
            print!("{}", render_custom_help(None));
            return Ok(());
        }
    };
    if let Command::InitConfig = command {
        return run_init_config(user_config_path);
    }

    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let unknown = config::unknown_field_ids(&cfg, &KNOWN_FIELDS);
    let run = build_run_config(&args, cfg)?;
    if run.no_color {
        colored::control::set_override(false);
    }
    crate::logging::init_tracing(run.verbose, run.no_color);
    if !unknown.is_empty() {
        tracing::warn!(fields = %unknown.iter().join(", "), "config names unknown fields");
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    match command {
        Command::Sample(sample) => rt.block_on(run_sample(run, sample)),
        Command::Patterns(patterns) => rt.block_on(run_patterns(run, patterns)),
        Command::Delete(delete) => rt.block_on(run_delete(run, delete)),
        Command::InitConfig => Ok(()),
    }
}
