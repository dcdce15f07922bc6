//! Core error types
//!
//! Re-exports aocraft-error and adds the constructors the session and store
//! reach for repeatedly.

pub use aocraft_error::{Error, ErrorKind, ErrorStatus, Result};

use std::path::Path;

/// Part 2 needs the accepted part 1 program to build on
pub fn missing_prior_solution(day: u32) -> Error {
    Error::config_invalid("part 2 requires the accepted part 1 solution")
        .with_operation("puzzle::new")
        .with_context("day", day.to_string())
}

/// Part must be 1 or 2
pub fn invalid_part(part: u8) -> Error {
    Error::config_invalid(format!("part must be 1 or 2, got {}", part))
        .with_context("part", part.to_string())
}

/// Wrap an IO failure while reading a puzzle resource
pub fn read_failed(what: &str, path: &Path, err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        return Error::file_not_found(what, path).set_source(err);
    }
    Error::new(
        ErrorKind::IoFailed,
        format!("failed to read {} at {}", what, path.display()),
    )
    .with_context("path", path.display().to_string())
    .set_source(err)
}

/// Wrap an IO failure while writing an attempt
pub fn write_failed(path: &Path, err: std::io::Error) -> Error {
    Error::storage_failed(format!("failed to write {}", path.display()))
        .with_operation("store::persist")
        .with_context("path", path.display().to_string())
        .set_source(err)
}
