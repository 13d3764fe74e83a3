//! Choice resolution for interactive selection.
//!
//! The engine only needs `select(options) → choice`; how the prompt is shown
//! is up to the [`Selector`] implementation.

use crate::domain::Result;

/// Picks one of several labelled options.
pub trait Selector {
    /// Returns the chosen index, or `None` if the user backed out.
    ///
    /// # Errors
    /// Returns error if input cannot be read.
    fn select(&mut self, prompt: &str, options: &[String]) -> Result<Option<usize>>;
}

/// Interpretation of one line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    /// A single option was identified.
    Picked(usize),
    /// Several options matched the search text.
    Ambiguous(Vec<usize>),
    /// Number out of range or no option matched.
    NoMatch,
}

/// Resolves input as a 1-based number, or else a case-insensitive substring
/// search over the option labels.
#[must_use]
pub fn resolve_choice(input: &str, options: &[String]) -> Choice {
    let input = input.trim();

    if let Ok(number) = input.parse::<usize>() {
        return if (1..=options.len()).contains(&number) {
            Choice::Picked(number - 1)
        } else {
            Choice::NoMatch
        };
    }

    let needle = input.to_lowercase();
    if needle.is_empty() {
        return Choice::NoMatch;
    }

    let matches: Vec<usize> = options
        .iter()
        .enumerate()
        .filter(|(_, label)| label.to_lowercase().contains(&needle))
        .map(|(i, _)| i)
        .collect();

    match matches.len() {
        0 => Choice::NoMatch,
        1 => Choice::Picked(matches[0]),
        _ => Choice::Ambiguous(matches),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        ["DM with ferris", "DM with corro", "Group with 3 members"]
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }

    #[test]
    fn test_resolve_by_number() {
        assert_eq!(resolve_choice("2", &options()), Choice::Picked(1));
        assert_eq!(resolve_choice(" 3 ", &options()), Choice::Picked(2));
        assert_eq!(resolve_choice("0", &options()), Choice::NoMatch);
        assert_eq!(resolve_choice("4", &options()), Choice::NoMatch);
    }

    #[test]
    fn test_resolve_by_search() {
        assert_eq!(resolve_choice("FERR", &options()), Choice::Picked(0));
        assert_eq!(resolve_choice("dm", &options()), Choice::Ambiguous(vec![0, 1]));
        assert_eq!(resolve_choice("nobody", &options()), Choice::NoMatch);
        assert_eq!(resolve_choice("", &options()), Choice::NoMatch);
    }
}
