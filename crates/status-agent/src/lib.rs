pub mod commands;
mod run;
pub mod store;

pub use run::{run, Phase, RunSummary};
pub use store::{MemoryStore, PgStore, Store, StoreError};
