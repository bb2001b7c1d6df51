pub mod commands;
pub mod config;
pub mod db;
pub mod embedding;
pub mod llm;

pub use commands::{dispatch, Cli, Command, ErrorResult, Reply};
