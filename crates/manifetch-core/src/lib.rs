pub mod config;
pub mod control;
pub mod discovery;
pub mod fetcher;
pub mod logging;
pub mod manifest;
pub mod retrieval;
pub mod retry;
pub mod scheduler;
pub mod storage;
