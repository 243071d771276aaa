pub mod args;
pub mod backup;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod output;
pub mod parser;
pub mod provider;
pub mod reconcile;
pub mod record;
pub mod snapshot;
pub mod transform;
pub mod validation;
