pub mod clock;
pub mod config;
pub mod database;
pub mod logging;
pub mod page_cache;
pub mod security;
