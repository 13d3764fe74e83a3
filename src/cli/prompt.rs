//! Line-based prompts on stdin/stdout.

use std::io::{self, BufRead, Write};

use colored::Colorize;

use crate::application::{resolve_choice, Choice, Selector};
use crate::domain::{AppError, Result};

/// [`Selector`] reading answers line by line.
///
/// `q` or end of input backs out; an empty line picks the first option.
pub struct StdinSelector<R, W> {
    input: R,
    output: W,
}

impl StdinSelector<io::StdinLock<'static>, io::Stdout> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: io::stdin().lock(),
            output: io::stdout(),
        }
    }
}

impl Default for StdinSelector<io::StdinLock<'static>, io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead, W: Write> StdinSelector<R, W> {
    pub const fn with_io(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt} [1]: ")
            .and_then(|()| self.output.flush())
            .map_err(|e| AppError::io("Failed to write prompt", e))?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| AppError::io("Failed to read input", e))?;

        let line = line.trim();
        if read == 0 || line.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        Ok(Some(if line.is_empty() { "1".into() } else { line.to_string() }))
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}").map_err(|e| AppError::io("Failed to write output", e))
    }
}

impl<R: BufRead, W: Write> Selector for StdinSelector<R, W> {
    fn select(&mut self, prompt: &str, options: &[String]) -> Result<Option<usize>> {
        if options.is_empty() {
            return Ok(None);
        }

        loop {
            let Some(answer) = self.ask(prompt)? else {
                return Ok(None);
            };

            match resolve_choice(&answer, options) {
                Choice::Picked(index) => return Ok(Some(index)),
                Choice::NoMatch => {
                    let warning = "Invalid selection or no match. Please try again.".red();
                    self.say(&warning.to_string())?;
                }
                Choice::Ambiguous(matches) => {
                    let header = format!("Found {} matches:", matches.len()).yellow();
                    self.say(&header.to_string())?;
                    let labels: Vec<String> =
                        matches.iter().map(|&i| options[i].clone()).collect();
                    for (n, label) in labels.iter().enumerate() {
                        self.say(&format!("  {}. {label}", n + 1))?;
                    }
                    if let Some(sub) = self.select("Select by number", &labels)? {
                        return Ok(Some(matches[sub]));
                    }
                }
            }
        }
    }
}

/// Reads one trimmed line from stdin after printing `prompt`.
///
/// # Errors
/// Returns error if stdin cannot be read.
pub fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout()
        .flush()
        .map_err(|e| AppError::io("Failed to write prompt", e))?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .map_err(|e| AppError::io("Failed to read input", e))?;

    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn options() -> Vec<String> {
        ["#general", "#random", "#rust-help"]
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }

    fn select(input: &str) -> Option<usize> {
        let mut selector = StdinSelector::with_io(Cursor::new(input.to_string()), Vec::new());
        selector.select("Pick", &options()).unwrap()
    }

    #[test]
    fn test_number_and_default() {
        assert_eq!(select("3\n"), Some(2));
        assert_eq!(select("\n"), Some(0));
    }

    #[test]
    fn test_retry_after_no_match() {
        assert_eq!(select("nothing\n9\nrandom\n"), Some(1));
    }

    #[test]
    fn test_ambiguous_then_sub_choice() {
        assert_eq!(select("rand\n"), Some(1));
        assert_eq!(select("e\n2\n"), Some(2));
    }

    #[test]
    fn test_quit_and_eof() {
        assert_eq!(select("q\n"), None);
        assert_eq!(select(""), None);
    }
}
