//! Core contracts between the runner and lessons.
//!
//! A lesson implements [`AppImplementation`] and describes its window with an
//! [`AppConfig`]; the runner owns everything else.

mod app;
mod config;

pub use app::AppImplementation;
pub use config::AppConfig;
