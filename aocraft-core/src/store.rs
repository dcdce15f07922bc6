//! # Attempt storage
//!
//! Every candidate program is written once under a name derived from
//! (day, part, attempt, provider, model):
//!
//! ```text
//! {root}/day{D}/solution_part{P}_try{N}_{provider}_{model}.{ext}
//! ```
//!
//! The model identifier is percent-encoded so that distinct inputs can never
//! share a file name: `[A-Za-z0-9.-]` is kept, every other byte (including
//! `_`, `/` and `%`) becomes `%XX`. Provider names never contain `_`, which
//! keeps the name parseable back into its parts.
//!
//! Writes go to a temp file in the target directory, are synced, then renamed
//! over the final name, so a reader sees either the old file or the new one.

use crate::error::{self, Error, Result};
use crate::provider::ProviderKind;
use crate::puzzle::Part;
use crate::session::Attempt;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A persisted attempt found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAttempt {
    pub path: PathBuf,
    pub day: u32,
    pub part: Part,
    pub number: u32,
    pub provider: ProviderKind,
    pub model: String,
}

/// Filesystem store for candidate solutions
#[derive(Debug, Clone)]
pub struct AttemptStore {
    root: PathBuf,
    extension: String,
}

impl AttemptStore {
    pub fn new(root: impl AsRef<Path>, extension: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn day_dir(&self, day: u32) -> PathBuf {
        self.root.join(format!("day{}", day))
    }

    /// File name for an attempt, without the day directory
    pub fn file_name(&self, part: Part, number: u32, provider: ProviderKind, model: &str) -> String {
        format!(
            "solution_part{}_try{}_{}_{}.{}",
            part.number(),
            number,
            provider.as_str(),
            encode_model(model),
            self.extension
        )
    }

    /// Where `attempt` is (or will be) stored
    pub fn location(&self, attempt: &Attempt) -> PathBuf {
        self.day_dir(attempt.day)
            .join(self.file_name(attempt.part, attempt.number, attempt.provider, &attempt.model))
    }

    /// Durably write `attempt`, replacing any file with the same identity.
    pub fn persist(&self, attempt: &Attempt) -> Result<PathBuf> {
        let dir = self.day_dir(attempt.day);
        let path = self.location(attempt);

        std::fs::create_dir_all(&dir).map_err(|e| error::write_failed(&dir, e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| error::write_failed(&path, e))?;
        tmp.write_all(attempt.source.as_bytes())
            .map_err(|e| error::write_failed(&path, e))?;
        tmp.as_file().sync_all().map_err(|e| error::write_failed(&path, e))?;
        tmp.persist(&path).map_err(|e| error::write_failed(&path, e.error))?;
        sync_dir(&dir)?;

        tracing::info!(
            path = %path.display(),
            attempt = attempt.number,
            bytes = attempt.source.len(),
            "attempt persisted"
        );
        Ok(path)
    }

    /// Attempts stored for `day`, optionally only one part, in
    /// (part, attempt, provider, model) order. A missing day directory is empty.
    pub fn list(&self, day: u32, part: Option<Part>) -> Result<Vec<StoredAttempt>> {
        let dir = self.day_dir(day);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(error::read_failed("attempt directory", &dir, e).with_operation("store::list"))
            }
        };

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| error::read_failed("attempt directory", &dir, e).with_operation("store::list"))?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let Some(stored) = self.parse_file_name(day, &name) else {
                continue;
            };
            if part.map_or(true, |p| p == stored.part) {
                found.push(StoredAttempt {
                    path: entry.path(),
                    ..stored
                });
            }
        }

        found.sort_by(|a, b| {
            (a.part.number(), a.number, a.provider.as_str(), &a.model)
                .cmp(&(b.part.number(), b.number, b.provider.as_str(), &b.model))
        });
        Ok(found)
    }

    /// Inverse of [`AttemptStore::file_name`]; `None` for foreign files
    pub fn parse_file_name(&self, day: u32, name: &str) -> Option<StoredAttempt> {
        let stem = name.strip_suffix(&format!(".{}", self.extension))?;
        let rest = stem.strip_prefix("solution_part")?;

        let mut fields = rest.splitn(4, '_');
        let part = fields.next()?.parse::<u8>().ok()?;
        let part = Part::try_from(part).ok()?;
        let number = fields.next()?.strip_prefix("try")?.parse::<u32>().ok()?;
        let provider = fields.next()?.parse::<ProviderKind>().ok()?;
        let model = decode_model(fields.next()?).ok()?;

        Some(StoredAttempt {
            path: self.day_dir(day).join(name),
            day,
            part,
            number,
            provider,
            model,
        })
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    std::fs::File::open(dir)
        .and_then(|f| f.sync_all())
        .map_err(|e| error::write_failed(dir, e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

/// Bytes kept literally in model file names; everything else is escaped
const MODEL_LITERALS: &AsciiSet = &NON_ALPHANUMERIC.remove(b'.').remove(b'-');

/// Percent-encode everything outside `[A-Za-z0-9.-]`
pub fn encode_model(model: &str) -> String {
    utf8_percent_encode(model, MODEL_LITERALS).to_string()
}

/// Inverse of [`encode_model`]. Only its exact output is accepted, so
/// stray `%` sequences or lowercase escapes are rejected.
pub fn decode_model(encoded: &str) -> Result<String> {
    let invalid = || {
        Error::invalid_argument(format!("malformed model encoding '{}'", encoded))
            .with_operation("store::decode_model")
    };

    let decoded = percent_decode_str(encoded).decode_utf8().map_err(|_| invalid())?;
    if encode_model(&decoded) != encoded {
        return Err(invalid());
    }
    Ok(decoded.into_owned())
}
