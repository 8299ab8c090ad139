//! Portfolio web server with an on-demand photo carousel agent.

pub mod args;
pub mod caption;
pub mod config;
pub mod error;
pub mod google;
pub mod graph;
pub mod imaging;
pub mod job;
pub mod legacy;
pub mod media;
pub mod publish;
pub mod stage;
pub mod storage;
pub mod web;

pub use config::Config;
pub use error::{Error, Result};
pub use stage::Stage;
