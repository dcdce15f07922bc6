//! # aocraft-error
//!
//! Unified error handling for aocraft, modelled on OpenDAL's error handling practices.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., FileNotFound, InferenceFailed)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use aocraft_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::FileNotFound, "no description for day 6")
//!         .with_operation("puzzle::read_description")
//!         .with_context("day", "6")
//!         .with_context("path", "day6/input/description_part2.txt"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All functions return `Result<T, aocraft_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using aocraft Error
pub type Result<T> = std::result::Result<T, Error>;
