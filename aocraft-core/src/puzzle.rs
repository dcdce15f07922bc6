//! # Puzzle context
//!
//! What a session is solving: the day, the part, the puzzle text, a sample
//! of the input, and for part 2 the accepted part 1 program.
//!
//! Puzzle files live under a root directory:
//!
//! ```text
//! {root}/
//!   day{D}/
//!     input/
//!       description_part{P}.txt
//!       input.txt
//! ```

use crate::error::{self, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Which half of a day's puzzle is being solved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Part {
    One,
    Two,
}

impl Part {
    pub fn number(&self) -> u8 {
        match self {
            Part::One => 1,
            Part::Two => 2,
        }
    }
}

impl TryFrom<u8> for Part {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Part::One),
            2 => Ok(Part::Two),
            other => Err(error::invalid_part(other)),
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Immutable per-session puzzle data.
///
/// Construction enforces that part 2 always carries a non-empty prior
/// solution, so a session can never reach the provider without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleContext {
    day: u32,
    part: Part,
    description: String,
    sample_input: String,
    prior_solution: Option<String>,
}

impl PuzzleContext {
    pub fn new(
        day: u32,
        part: u8,
        description: impl Into<String>,
        sample_input: impl Into<String>,
        prior_solution: Option<String>,
    ) -> Result<Self> {
        if day == 0 {
            return Err(Error::config_invalid("day must be at least 1")
                .with_operation("puzzle::new")
                .with_context("day", "0"));
        }
        let part = Part::try_from(part).map_err(|e| e.with_operation("puzzle::new"))?;

        let prior_solution = match part {
            Part::One => {
                if prior_solution.is_some() {
                    tracing::warn!(day, "ignoring prior solution for part 1");
                }
                None
            }
            Part::Two => match prior_solution {
                Some(text) if !text.trim().is_empty() => Some(text),
                _ => return Err(error::missing_prior_solution(day)),
            },
        };

        Ok(Self {
            day,
            part,
            description: description.into(),
            sample_input: sample_input.into(),
            prior_solution,
        })
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn part(&self) -> Part {
        self.part
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn sample_input(&self) -> &str {
        &self.sample_input
    }

    /// Present exactly when `part()` is `Part::Two`
    pub fn prior_solution(&self) -> Option<&str> {
        self.prior_solution.as_deref()
    }
}

/// Reads puzzle descriptions and inputs from the day directories.
#[derive(Debug, Clone)]
pub struct PuzzleInputs {
    root: PathBuf,
}

impl PuzzleInputs {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn day_dir(&self, day: u32) -> PathBuf {
        self.root.join(format!("day{}", day))
    }

    pub fn description_path(&self, day: u32, part: Part) -> PathBuf {
        self.day_dir(day)
            .join("input")
            .join(format!("description_part{}.txt", part.number()))
    }

    pub fn input_path(&self, day: u32) -> PathBuf {
        self.day_dir(day).join("input").join("input.txt")
    }

    pub fn read_description(&self, day: u32, part: Part) -> Result<String> {
        let path = self.description_path(day, part);
        std::fs::read_to_string(&path).map_err(|e| {
            error::read_failed("description", &path, e)
                .with_operation("puzzle::read_description")
                .with_context("day", day.to_string())
        })
    }

    pub fn read_input(&self, day: u32) -> Result<String> {
        let path = self.input_path(day);
        std::fs::read_to_string(&path).map_err(|e| {
            error::read_failed("input", &path, e)
                .with_operation("puzzle::read_input")
                .with_context("day", day.to_string())
        })
    }

    /// Read description and input for `(day, part)`; both must exist
    pub fn load(&self, day: u32, part: Part) -> Result<(String, String)> {
        let description = self.read_description(day, part)?;
        let input = self.read_input(day)?;
        tracing::debug!(
            day,
            part = part.number(),
            description_len = description.len(),
            input_len = input.len(),
            "loaded puzzle"
        );
        Ok((description, input))
    }

    /// Everything a session needs for `(day, part)`.
    ///
    /// The prior solution is read first, so a part 2 run with a bad path fails
    /// before any puzzle file is touched.
    pub fn context(&self, day: u32, part: Part, prior_solution: Option<&Path>) -> Result<PuzzleContext> {
        let prior = prior_solution.map(read_prior_solution).transpose()?;
        let (description, input) = self.load(day, part)?;
        PuzzleContext::new(day, part.number(), description, input, prior)
    }
}

/// Read an accepted part 1 program from a caller-supplied path
pub fn read_prior_solution(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|e| {
        error::read_failed("prior solution", path, e).with_operation("puzzle::read_prior_solution")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_part_conversion() {
        assert_eq!(Part::try_from(1).unwrap(), Part::One);
        assert_eq!(Part::try_from(2).unwrap(), Part::Two);
        let err = Part::try_from(3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_part_two_requires_prior_solution() {
        let err = PuzzleContext::new(6, 2, "desc", "input", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.context_value("day"), Some("6"));

        let err = PuzzleContext::new(6, 2, "desc", "input", Some("  \n".into())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let ctx = PuzzleContext::new(6, 2, "desc", "input", Some("print(1)".into())).unwrap();
        assert_eq!(ctx.prior_solution(), Some("print(1)"));
    }

    #[test]
    fn test_part_one_drops_prior_solution() {
        let ctx = PuzzleContext::new(3, 1, "desc", "input", Some("print(1)".into())).unwrap();
        assert_eq!(ctx.part(), Part::One);
        assert!(ctx.prior_solution().is_none());
    }

    #[test]
    fn test_day_zero_rejected() {
        let err = PuzzleContext::new(0, 1, "desc", "input", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_inputs_layout() {
        let inputs = PuzzleInputs::new("/puzzles");
        assert_eq!(
            inputs.description_path(6, Part::Two),
            PathBuf::from("/puzzles/day6/input/description_part2.txt")
        );
        assert_eq!(inputs.input_path(6), PathBuf::from("/puzzles/day6/input/input.txt"));
    }

    #[test]
    fn test_load_reads_both_files() {
        let dir = TempDir::new().unwrap();
        let input_dir = dir.path().join("day4").join("input");
        std::fs::create_dir_all(&input_dir).unwrap();
        std::fs::write(input_dir.join("description_part1.txt"), "Find XMAS").unwrap();
        std::fs::write(input_dir.join("input.txt"), "MMMSXXMASM").unwrap();

        let inputs = PuzzleInputs::new(dir.path());
        let (description, input) = inputs.load(4, Part::One).unwrap();
        assert_eq!(description, "Find XMAS");
        assert_eq!(input, "MMMSXXMASM");
    }

    #[test]
    fn test_missing_description_reports_path() {
        let dir = TempDir::new().unwrap();
        let inputs = PuzzleInputs::new(dir.path());

        let err = inputs.load(9, Part::Two).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(err.operation(), "puzzle::read_description");
        let path = err.context_value("path").unwrap();
        assert!(path.ends_with("description_part2.txt"));
    }

    fn day_six(dir: &TempDir) -> PuzzleInputs {
        let input_dir = dir.path().join("day6").join("input");
        std::fs::create_dir_all(&input_dir).unwrap();
        std::fs::write(input_dir.join("description_part2.txt"), "Add one obstruction.").unwrap();
        std::fs::write(input_dir.join("input.txt"), "....#.....").unwrap();
        PuzzleInputs::new(dir.path())
    }

    #[test]
    fn test_context_part_two_requires_prior() {
        let dir = TempDir::new().unwrap();
        let inputs = day_six(&dir);

        let err = inputs.context(6, Part::Two, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.operation(), "puzzle::new");

        let err = inputs
            .context(6, Part::Two, Some(&dir.path().join("day6/solution_part1.py")))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(err.operation(), "puzzle::read_prior_solution");
    }

    #[test]
    fn test_context_reads_prior_solution() {
        let dir = TempDir::new().unwrap();
        let inputs = day_six(&dir);
        let prior = dir.path().join("part1.py");
        std::fs::write(&prior, "print(41)\n").unwrap();

        let ctx = inputs.context(6, Part::Two, Some(&prior)).unwrap();
        assert_eq!(ctx.prior_solution(), Some("print(41)\n"));
        assert_eq!(ctx.description(), "Add one obstruction.");
    }

    #[test]
    fn test_missing_prior_solution_file() {
        let dir = TempDir::new().unwrap();
        let err = read_prior_solution(dir.path().join("nope.py")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert!(err.message().contains("prior solution"));
    }
}
