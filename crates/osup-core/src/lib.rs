pub mod config;
pub mod logging;

pub mod report;
pub mod retry;
pub mod scheduler;
pub mod source;
pub mod store;
pub mod upload;
pub mod validate;
