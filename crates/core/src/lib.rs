//! Core types, filters, and validation for the log processor.

pub mod error;
pub mod events;
pub mod filter;
pub mod limits;
pub mod search;
pub mod store;

pub use error::{CapacityErrorCode, DbErrorCode, Error, Result, ValidationErrorCode};
pub use events::*;
pub use filter::*;
pub use search::SearchEngine;
pub use store::*;
