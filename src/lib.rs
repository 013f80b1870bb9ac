pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod controller;
pub mod form;
pub mod logging;
pub mod output;
pub mod repl;
pub mod selection;
pub mod table;
pub mod utils;

#[cfg(test)]
mod tests;
