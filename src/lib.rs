pub mod collector;
pub mod config;
pub mod constants;
pub mod crawler;
pub mod dates;
pub mod driver;
pub mod error;
pub mod event;
pub mod logging;
pub mod metrics;
pub mod navigator;
pub mod pipeline;
pub mod retry;
pub mod session;
pub mod storage;
pub mod types;
pub mod viewport;
