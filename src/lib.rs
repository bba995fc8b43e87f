pub mod app;
pub mod app_dirs;
pub mod boundaries;
pub mod config;
pub mod language;
pub mod logging;
pub mod result;
pub mod runtime;
pub mod session;
pub mod srs;
pub mod state;
pub mod stats;
pub mod store;
pub mod time_series;
pub mod typing_policy;
pub mod ui;
pub mod visual;
pub mod word_generator;
