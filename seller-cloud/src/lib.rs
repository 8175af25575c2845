//! seller-cloud: marketplace seller analytics service
//!
//! - Keeps the seller's marketplace OAuth credential fresh
//! - Derives sales, cost and profit views from the seller's orders
//! - Caches period statistics and archives seller data in PostgreSQL
//! - Buffers marketplace webhook notifications in Redis

pub mod analytics;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod kv;
pub mod marketplace;
pub mod money;
pub mod notifications;
pub mod state;
pub mod token;

pub use config::Config;
pub use state::AppState;
