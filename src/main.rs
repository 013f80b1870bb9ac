use std::process::exit;

use colored::Colorize;

fn main() {
    if let Err(err) = patternscope::app::run_cli() {
        eprintln!("{} {}", "error:".red().bold(), err);
        exit(1);
    }
}
