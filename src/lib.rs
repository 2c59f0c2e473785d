pub mod api;
pub mod app;
pub mod config;
pub mod format;
pub mod handler;
pub mod logging;
pub mod mode;
pub mod picker;
pub mod state;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use api::{ApiClient, Backend, QueryResult, ServiceStatus, SourceHit};
pub use config::Config;
pub use mode::Mode;
pub use state::{ChatMessage, ChatRole, Conversation};
