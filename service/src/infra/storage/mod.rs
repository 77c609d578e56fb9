//! [`Storage`]-related implementations.

pub mod file;
pub mod memory;

use derive_more::{Display, Error as StdError, From};

pub use self::{file::File, memory::Memory};

/// [`Subscription`] persistence operation.
///
/// [`Subscription`]: crate::domain::Subscription
pub use common::Handler as Storage;

/// [`Storage`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Filesystem operation failed.
    #[display("I/O operation failed: {_0}")]
    Io(std::io::Error),

    /// Stored record is malformed.
    #[display("malformed record: {_0}")]
    Json(serde_json::Error),
}
