pub mod cli;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use cli::{CliApp, ListenArgs};
pub use config::{
    DEFAULT_CSV_FLUSH_EVERY, DEFAULT_PAGE_LIMIT, DEFAULT_SESSION_DURATION, ListenerConfig,
    parse_timestamp,
};
pub use error::AppError;
