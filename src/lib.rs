pub mod aggregator;
pub mod app;
pub mod cache;
pub mod config;
pub mod errors;
pub mod fetcher;
pub mod handlers;
pub mod models;
pub mod stats;
pub mod ui;
pub mod state;

pub use aggregator::Aggregator;
pub use app::router;
pub use cache::ResultCache;
pub use config::Config;
pub use state::AppState;
