// Public modules
pub mod archive;
pub mod cli;
pub mod crypto;
pub mod download;
pub mod error;
pub mod install;
pub mod manifest;
pub mod models;
pub mod runner;
pub mod scratch;
pub mod shell;
pub mod utils;
pub mod vars;

// Re-export commonly used types
pub use error::SetupError;
pub use models::*;
