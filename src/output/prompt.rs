//! Yes/no confirmation before destructive operations.

use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

/// Asks the user to confirm an action
pub trait Confirm {
    /// Show `question` and return whether the user agreed
    ///
    /// # Errors
    ///
    /// Returns an error if the answer cannot be read.
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> Result<bool>,
{
    fn confirm(&mut self, question: &str) -> Result<bool> {
        self(question)
    }
}

/// Reads the answer from stdin; anything but `y`/`yes` declines
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        print!("{question} [y/N]: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin()
            .lock()
            .read_line(&mut input)
            .context("Failed to read confirmation from stdin")?;

        Ok(is_yes(&input))
    }
}

/// Whether `answer` is an affirmative reply
fn is_yes(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes("  YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }

    #[test]
    fn test_closure_confirm() -> Result<()> {
        let mut asked = Vec::new();
        let mut answer = |q: &str| -> Result<bool> {
            asked.push(q.to_string());
            Ok(false)
        };
        assert!(!answer.confirm("Clear?")?);
        assert_eq!(asked, ["Clear?"]);
        Ok(())
    }
}
