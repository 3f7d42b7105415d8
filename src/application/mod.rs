// Application layer: the domain-facing facade over the ledger store
// and the library error type.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
