pub mod coalescer;
pub mod config;
pub mod console;
pub mod kvstore;
pub mod logging;
pub mod scheduler;
