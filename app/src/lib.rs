pub mod cli;
pub mod config;
pub mod error;
pub mod prefs;
pub mod runtime;
