pub mod catalog;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod matcher;
mod metrics;
pub mod planet;
pub mod recognizer;
pub mod server;
pub mod utils;

pub use catalog::{Catalog, ReferenceEntry};
pub use config::Opts;
pub use recognizer::{Recognition, Recognizer};
