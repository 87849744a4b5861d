pub mod config;
pub mod export;
pub mod google_sheets;
pub mod http_client;
pub mod ledger;
pub mod memory_store;
pub mod picks;
pub mod player_stats;
pub mod runner;
pub mod scoring;
pub mod sheets;
pub mod standings;
pub mod teams;
pub mod writer;
