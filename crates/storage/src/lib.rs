#![forbid(unsafe_code)]

mod config;
mod db;
mod entry;
mod queue;
mod reaper;

pub use config::StoreConfig;
pub use db::{Db, TtlStatus};
pub use queue::QueueStore;
