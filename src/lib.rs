pub mod app;
pub mod classifier;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod intake;
pub mod tasks;
