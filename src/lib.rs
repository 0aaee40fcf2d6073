//! Subscribe chat channels to RSS feeds, poll them on a timer and post new entries.

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod scheduler;
pub mod services;
pub mod sources;
pub mod storage;
