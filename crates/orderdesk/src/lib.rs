pub mod agent;
pub mod agents;
pub mod config;
pub mod errors;
pub mod logsearch;
pub mod models;
pub mod providers;
pub mod store;
pub mod turn;
