//! Step outcomes and the counters derived from them.
//!
//! Status strings are parsed once, at the boundary, into [`Outcome`]. Every
//! pass/fail/skip decision made afterwards goes through the predicates defined
//! here so the precedence law (failure beats skip, skip beats pass) lives in a
//! single place.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ModelError;

/// Result classification of a single step or hook execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The step ran and succeeded.
    Passed,
    /// The step ran and failed.
    Failed,
    /// The step was not run because an earlier step did not pass.
    Skipped,
    /// No step definition matched the step text.
    Undefined,
}

impl Outcome {
    /// Whether the outcome counts as a pass.
    #[must_use]
    pub const fn is_pass(self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Whether the outcome counts as a failure.
    ///
    /// Undefined steps mean the automation is missing, so they fail rather
    /// than skip.
    ///
    /// # Examples
    /// ```
    /// use cucumber_results::Outcome;
    ///
    /// assert!(Outcome::Undefined.is_failure());
    /// assert!(!Outcome::Skipped.is_failure());
    /// ```
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Undefined)
    }

    /// Whether the outcome counts as a skip, which is neither pass nor fail.
    #[must_use]
    pub const fn is_skip(self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Lowercase label as written in Cucumber reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Undefined => "undefined",
        }
    }

    /// Counters for a single leaf carrying this outcome.
    #[must_use]
    pub fn counts(self, duration: Duration) -> Counts {
        Counts {
            pass: usize::from(self.is_pass()),
            fail: usize::from(self.is_failure()),
            skip: usize::from(self.is_skip()),
            duration,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Outcome {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            "skipped" => Ok(Self::Skipped),
            "undefined" => Ok(Self::Undefined),
            _ => Err(ModelError::UnknownOutcome {
                status: s.to_string(),
            }),
        }
    }
}

/// Folds a sequence of outcomes into `(failed, skipped)` flags.
///
/// Failure dominates skip: once any outcome fails, `skipped` is `false`
/// regardless of what else was seen.
///
/// # Examples
/// ```
/// use cucumber_results::outcome::rollup;
/// use cucumber_results::Outcome;
///
/// assert_eq!(rollup([Outcome::Skipped, Outcome::Failed]), (true, false));
/// assert_eq!(rollup([Outcome::Passed, Outcome::Skipped]), (false, true));
/// assert_eq!(rollup([]), (false, false));
/// ```
#[must_use]
pub fn rollup(outcomes: impl IntoIterator<Item = Outcome>) -> (bool, bool) {
    let (failed, skipped) = outcomes
        .into_iter()
        .fold((false, false), |(failed, skipped), outcome| {
            (failed || outcome.is_failure(), skipped || outcome.is_skip())
        });
    (failed, skipped && !failed)
}

/// Pass/fail/skip counters plus cumulative duration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counts {
    /// Number of passed units.
    pub pass: usize,
    /// Number of failed units.
    pub fail: usize,
    /// Number of skipped units.
    pub skip: usize,
    /// Total time spent.
    pub duration: Duration,
}

impl Counts {
    /// Counters for one scenario-like unit, applying fail > skip > pass.
    #[must_use]
    pub fn unit(failed: bool, skipped: bool, duration: Duration) -> Self {
        Self {
            pass: usize::from(!failed && !skipped),
            fail: usize::from(failed),
            skip: usize::from(skipped && !failed),
            duration,
        }
    }

    /// Number of units covered.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pass + self.fail + self.skip
    }

    /// Duration expressed in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }

    /// Whether nothing failed. A tree with no scenarios at all has passed.
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        self.fail == 0
    }
}

impl Add for Counts {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for Counts {
    fn add_assign(&mut self, rhs: Self) {
        self.pass += rhs.pass;
        self.fail += rhs.fail;
        self.skip += rhs.skip;
        self.duration += rhs.duration;
    }
}

impl Sum for Counts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
