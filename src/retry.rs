use std::fmt::Display;

use log::warn;

/// What to do with a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Retry,
    Abort,
}

/// Runs a fallible operation up to a fixed number of attempts.
///
/// Every failure that will be retried is logged as a warning. The last
/// failure (or the first one classified as [`Verdict::Abort`]) is handed
/// back to the caller, which decides whether to absorb or escalate it.
pub struct Retry<'a> {
    attempts: u32,
    label: &'a str,
}

impl<'a> Retry<'a> {
    pub fn new(attempts: u32, label: &'a str) -> Self {
        Self {
            attempts: attempts.max(1),
            label,
        }
    }

    pub fn run<T, E, F>(&self, op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        self.run_classified(op, |_| Verdict::Retry)
    }

    /// `op` receives the 1-based attempt number.
    pub fn run_classified<T, E, F, C>(&self, mut op: F, classify: C) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
        C: Fn(&E) -> Verdict,
    {
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.attempts && classify(&e) == Verdict::Retry => {
                    warn!(
                        "{} attempt {}/{} failed: {}. Retrying...",
                        self.label, attempt, self.attempts, e
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
