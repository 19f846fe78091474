//! Descriptor-driven SQLite helper for embedded application databases.
//!
//! # Intention
//!
//! - Turn plain descriptors into single SQL statements and name-keyed
//!   records, so callers never concatenate SQL themselves.
//! - Encapsulate SQLite-specific connection handling, row decoding, and
//!   error policy.
//!
//! # Architectural Boundaries
//!
//! - Only descriptor/statement/record plumbing belongs here.
//! - No application logic; controllers build descriptors and consume
//!   records.

pub mod connection;
pub mod error;
pub mod helper;
pub mod query;
pub mod value;

pub use error::{DbError, DbResult};
pub use helper::DbHelper;
pub use query::Descriptor;
pub use value::{Data, Record, Value};
