//! Application use cases / business logic

pub mod change_store;
pub mod format;
pub mod relay_loop;

pub use change_store::ChangeStore;
pub use format::Formatter;
pub use relay_loop::{
    DEFAULT_POLL_INTERVAL_MINS, RelayLoop, RelayLoopConfig, RelayLoopError, poll_interval,
};
