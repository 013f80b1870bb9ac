use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "patternscope",
    version,
    about = "association-rule pattern browser for the github patterns backend",
    long_about = "patternscope creates repository samples on a pattern-mining backend, searches them for association rules and lets you filter, sort and export the results.\n\nExamples:\n  patternscope sample --item pushes --item forks=dec --item language\n  patternscope patterns --ids 3,7 --minsup 0.05 --fa forks --sort lift:desc\n  patternscope patterns --ids 3 --interactive\n  patternscope delete 7\n\nTip: Use --config to keep the server URL and field defaults out of the command line."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.patternscope/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 's',
        long = "srv",
        visible_alias = "server",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "Backend base URL."
    )]
    pub server: Option<String>,

    #[arg(
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        global = true,
        help_heading = "HTTP",
        help = "Request timeout in seconds (transport default when unset)."
    )]
    pub timeout: Option<u64>,

    #[arg(
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "Proxy for all requests."
    )]
    pub proxy: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a repository sample on the backend.
    Sample(SampleArgs),
    /// Search saved samples for association rules.
    Patterns(PatternArgs),
    /// Delete saved samples by id.
    Delete(DeleteArgs),
    /// Write the default config file if it does not exist yet.
    InitConfig,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SampleArgs {
    #[arg(
        long = "sd",
        visible_alias = "start-date",
        value_name = "YYYY-MM-DD",
        help_heading = "Sample",
        help = "First day of the sampled period (default: three months ago)."
    )]
    pub start_date: Option<String>,

    #[arg(
        long = "ed",
        visible_alias = "end-date",
        value_name = "YYYY-MM-DD",
        help_heading = "Sample",
        help = "Last day of the sampled period (default: today)."
    )]
    pub end_date: Option<String>,

    #[arg(
        long = "mp",
        visible_alias = "min-participants",
        value_name = "N",
        help_heading = "Sample",
        help = "Minimum number of participants per repository."
    )]
    pub min_participants: Option<String>,

    #[arg(
        long = "ms",
        visible_alias = "min-stars",
        value_name = "N",
        help_heading = "Sample",
        help = "Minimum number of stars per repository."
    )]
    pub min_stars: Option<String>,

    #[arg(
        long = "nr",
        visible_alias = "num-repos",
        value_name = "N",
        help_heading = "Sample",
        help = "Number of repositories to sample."
    )]
    pub num_repos: Option<String>,

    #[arg(
        long = "new",
        visible_alias = "new-repos",
        help_heading = "Sample",
        help = "Sample new repositories instead of all repositories."
    )]
    pub new_repos: bool,

    #[arg(
        long = "note",
        value_name = "TEXT",
        help_heading = "Sample",
        help = "Free-text note stored with the sample."
    )]
    pub note: Option<String>,

    #[arg(
        long = "item",
        value_name = "LABEL[=dec|qua]",
        action = ArgAction::Append,
        help_heading = "Transaction items",
        help = "Transaction item to include (repeatable, at least 3)."
    )]
    pub items: Vec<String>,

    #[arg(
        long = "li",
        visible_alias = "list-items",
        help_heading = "Transaction items",
        help = "Print the item catalog and exit."
    )]
    pub list_items: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PatternArgs {
    #[arg(
        long = "ids",
        value_name = "IDS",
        help_heading = "Datasets",
        help = "Comma-separated sample ids to search, in selection order."
    )]
    pub ids: Option<String>,

    #[arg(
        long = "id",
        value_name = "ID",
        action = ArgAction::Append,
        help_heading = "Datasets",
        help = "Sample id to search (repeatable)."
    )]
    pub id: Vec<String>,

    #[arg(
        long = "ant",
        visible_alias = "antecedent",
        value_name = "N",
        help_heading = "Rule shape",
        help = "Minimum antecedent length."
    )]
    pub antecedent: Option<String>,

    #[arg(
        long = "ant-max",
        visible_alias = "antecedent-max",
        value_name = "N",
        help_heading = "Rule shape",
        help = "Maximum antecedent length."
    )]
    pub antecedent_max: Option<String>,

    #[arg(
        long = "con",
        visible_alias = "consequent",
        value_name = "N",
        help_heading = "Rule shape",
        help = "Minimum consequent length."
    )]
    pub consequent: Option<String>,

    #[arg(
        long = "con-max",
        visible_alias = "consequent-max",
        value_name = "N",
        help_heading = "Rule shape",
        help = "Maximum consequent length."
    )]
    pub consequent_max: Option<String>,

    #[arg(
        long = "minsup",
        value_name = "FLOAT",
        help_heading = "Thresholds",
        help = "Minimum support."
    )]
    pub minsup: Option<String>,

    #[arg(
        long = "minconf",
        value_name = "FLOAT",
        help_heading = "Thresholds",
        help = "Minimum confidence."
    )]
    pub minconf: Option<String>,

    #[arg(
        long = "lift",
        value_name = "FLOAT",
        help_heading = "Thresholds",
        help = "Minimum lift."
    )]
    pub lift: Option<String>,

    #[arg(
        long = "fa",
        visible_alias = "filter-antecedent",
        value_name = "EXPR",
        help_heading = "Results",
        help = "Antecedent filter: terms joined by '&', leading '~' negates."
    )]
    pub filter_antecedent: Option<String>,

    #[arg(
        long = "fc",
        visible_alias = "filter-consequent",
        value_name = "EXPR",
        help_heading = "Results",
        help = "Consequent filter: terms joined by '&', leading '~' negates."
    )]
    pub filter_consequent: Option<String>,

    #[arg(
        long = "sort",
        value_name = "COLUMN[:asc|desc]",
        help_heading = "Results",
        help = "Sort the patterns table by a column name or index."
    )]
    pub sort: Option<String>,

    #[arg(
        long = "hq",
        visible_alias = "hide-quantiles",
        help_heading = "Results",
        help = "Do not print the quartile and decile tables."
    )]
    pub hide_quantiles: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "export",
        value_name = "FILE",
        help_heading = "Export",
        help = "Write the patterns table to a file (.xlsx, .csv, .json, .html, .txt)."
    )]
    pub export: Option<String>,

    #[arg(
        long = "of",
        visible_alias = "export-format",
        value_name = "FORMAT",
        help_heading = "Export",
        help = "Export format (spreadsheet, csv, json, html, text); inferred from the file extension by default."
    )]
    pub export_format: Option<String>,

    #[arg(
        long = "vo",
        visible_alias = "visible-only",
        help_heading = "Export",
        help = "Export only rows that pass the filters."
    )]
    pub visible_only: bool,

    #[arg(
        short = 'i',
        long = "it",
        visible_alias = "interactive",
        help_heading = "Session",
        help = "Open an interactive session instead of a single search."
    )]
    pub interactive: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    #[arg(value_name = "ID", required = true, help = "Sample ids to delete.")]
    pub ids: Vec<String>,
}
