//! services/app/src/lib.rs
//!
//! Host crate for the presentation layer: configuration, logging, storage and hashing
//! adapters, input validation, the `App` facade and its background timers.

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod timers;
pub mod validation;

pub use app::App;
pub use config::Config;
pub use error::AppError;
