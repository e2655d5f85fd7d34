mod args;
mod context;
mod entrypoints;
mod error;
mod event;
mod host;
mod script_log;
mod storage;
mod store;

pub use args::*;
pub use context::*;
pub use entrypoints::*;
pub use error::*;
pub use event::*;
pub use host::*;
pub use script_log::*;
pub use storage::*;
pub use store::*;
