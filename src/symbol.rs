//! Alternative symbols
//!
//! This module provides the single-letter symbol that identifies one
//! alternative of a multiple-choice question. Symbols are drawn from the
//! fixed alphabet `A`-`H`; a question configured with N alternatives uses
//! the first N letters. Symbols order and serialize as their letter so
//! that answer maps stay stably enumerable.

use std::{fmt::Display, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

/// Every letter an alternative can be labeled with, in display order
pub const ALPHABET: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// The letter identifying one alternative of a question
///
/// Construction goes through [`TryFrom<char>`] or [`FromStr`], which
/// accept lowercase input and reject anything outside the alphabet, so a
/// `Symbol` always holds one of the uppercase letters in [`ALPHABET`].
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct Symbol(char);

/// Errors that can occur when parsing an alternative symbol
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The letter is not one of `A`-`H`.
    #[error("'{0}' is not an alternative between A and H")]
    OutsideAlphabet(char),
    /// The input was not a single letter.
    #[error("an alternative is a single letter, got {0:?}")]
    NotASingleLetter(String),
}

impl Symbol {
    /// Returns the first `count` symbols of the alphabet in display order
    ///
    /// This is the alternative set of a question configured with `count`
    /// alternatives. Counts beyond the alphabet are truncated to it.
    pub fn alphabet(count: usize) -> impl Iterator<Item = Symbol> {
        ALPHABET.iter().take(count).copied().map(Symbol)
    }

    /// Returns the underlying uppercase letter
    pub fn as_char(self) -> char {
        self.0
    }
}

impl TryFrom<char> for Symbol {
    type Error = Error;

    /// Converts a letter into a symbol, uppercasing it first
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutsideAlphabet`] if the letter is not one of
    /// `A`-`H` in either case.
    fn try_from(letter: char) -> Result<Self, Self::Error> {
        let upper = letter.to_ascii_uppercase();
        if ALPHABET.contains(&upper) {
            Ok(Self(upper))
        } else {
            Err(Error::OutsideAlphabet(letter))
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = Error;

    /// Parses a symbol from a one-letter string
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotASingleLetter`] for empty or multi-character
    /// input, and [`Error::OutsideAlphabet`] for a letter outside `A`-`H`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut letters = s.chars();
        match (letters.next(), letters.next()) {
            (Some(letter), None) => Symbol::try_from(letter),
            _ => Err(Error::NotASingleLetter(s.to_owned())),
        }
    }
}
