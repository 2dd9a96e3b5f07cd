pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod output;
pub mod record;
pub mod session;
pub mod sink;
pub mod transform;
