pub mod config;
pub mod error;
pub mod format;
pub mod record;
pub mod state;
