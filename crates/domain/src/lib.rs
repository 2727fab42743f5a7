//! rss-relay domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `fingerprint`: Content digests used for change detection
//! - `usecases`: Change detection, formatting and the relay loop

pub mod fingerprint;
pub mod model;
pub mod ports;
pub mod usecases;

pub use fingerprint::{Fingerprint, fingerprint};
pub use model::*;
pub use ports::*;
