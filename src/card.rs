//! Scratch cards
//!
//! This module implements one team's scratch card: an ordered set of
//! questions built from the test's solution string, addressed by a
//! globally unique id that doubles as the team's bookmark token. The
//! card derives its aggregate state and first-attempt score from its
//! questions and produces the one-line text export used by the teacher
//! download.

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    constants,
    question::{self, Question},
    symbol::Symbol,
};

/// A globally unique identifier for a scratch card
///
/// Card ids are handed to students as their bookmark token, so they are
/// long and unguessable rather than communicable.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct CardId(Uuid);

impl CardId {
    /// Creates a new random card id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CardId {
    /// Creates a new random card id (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CardId {
    /// Formats the card id as a UUID string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CardId {
    type Err = uuid::Error;

    /// Parses a card id from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Aggregate progress of a card, derived from its questions
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
pub enum CardState {
    /// No question has been started
    #[display("idle")]
    Idle,
    /// At least one question has been started
    #[display("ongoing")]
    Ongoing,
    /// Every question is finished
    #[display("finished")]
    Finished,
}

/// Errors that can occur when building or playing a card
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The solution does not provide one letter per question.
    #[error("a card with {question_count} questions needs {question_count} solution letters, got {letters}")]
    InvalidSolution {
        /// How many questions the card was asked to hold
        question_count: usize,
        /// How many letters the solution provided
        letters: usize,
    },
    /// The card has no question with that number.
    #[error("question {0} is not on this card")]
    QuestionNotFound(u32),
    /// The uncover failed inside the question.
    #[error(transparent)]
    Question(#[from] question::Error),
}

/// One team's scratch card
///
/// The question map is keyed by the 1-based question number and ordered
/// numerically, so the status table and exports enumerate questions in
/// position order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Externally addressable identifier
    id: CardId,
    /// Display label shared with the owning test
    label: String,
    /// The team this card belongs to
    team: String,
    /// Number of alternatives per question
    alternatives: usize,
    /// The correct alternative letters, one per question
    solution: String,
    /// Display color tag for the team
    color: String,
    /// Questions keyed by their number
    questions: BTreeMap<u32, Question>,
}

impl Card {
    /// Creates a card with a fresh id and one question per solution letter
    ///
    /// Question `i` is wired so that its correct alternative is the
    /// `i`-th letter of `solution`, matched case-insensitively. A missing
    /// label falls back to the default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSolution`] if the solution does not
    /// provide exactly one letter per question. Callers creating a whole
    /// test validate the solution up front; this check remains for cards
    /// built directly.
    pub fn new(
        label: Option<String>,
        team: impl Into<String>,
        question_count: usize,
        alternatives: usize,
        solution: &str,
        color: impl Into<String>,
    ) -> Result<Self, Error> {
        let letters = solution.chars().count();
        if letters != question_count {
            return Err(Error::InvalidSolution {
                question_count,
                letters,
            });
        }
        let questions = solution
            .chars()
            .enumerate()
            .map(|(index, letter)| {
                let number = u32::try_from(index + 1).unwrap_or(u32::MAX);
                (number, Question::new(number, letter, alternatives))
            })
            .collect();
        Ok(Self {
            id: CardId::new(),
            label: label.unwrap_or_else(|| constants::card::DEFAULT_LABEL.to_owned()),
            team: team.into(),
            alternatives,
            solution: solution.to_owned(),
            color: color.into(),
            questions,
        })
    }

    /// Reveals one alternative of one question
    ///
    /// The card itself is not persisted here; the caller stores it after
    /// a successful uncover.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QuestionNotFound`] if the card has no question
    /// with that number, or the question's error if the symbol is not
    /// one of its alternatives.
    pub fn uncover(&mut self, question: u32, alternative: Symbol) -> Result<(), Error> {
        let entry = self
            .questions
            .get_mut(&question)
            .ok_or(Error::QuestionNotFound(question))?;
        entry.uncover(alternative)?;
        Ok(())
    }

    /// Returns the card's identifier
    pub fn id(&self) -> CardId {
        self.id
    }

    /// Returns the display label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the owning team's identifier
    pub fn team(&self) -> &str {
        &self.team
    }

    /// Returns the number of alternatives per question
    pub fn alternatives(&self) -> usize {
        self.alternatives
    }

    /// Returns the solution string
    pub fn solution(&self) -> &str {
        &self.solution
    }

    /// Returns the team's display color
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Returns the questions in position order
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.values()
    }

    /// Looks up one question by its number
    pub fn question(&self, number: u32) -> Option<&Question> {
        self.questions.get(&number)
    }

    /// Derives the aggregate state of the card
    ///
    /// `Finished` when every question is finished, otherwise `Ongoing`
    /// when any question has been started, otherwise `Idle`. Finished
    /// takes priority when both hold.
    pub fn state(&self) -> CardState {
        let mut started = false;
        let mut finished = true;
        for question in self.questions.values() {
            if question.is_started() {
                started = true;
            }
            if !question.is_finished() {
                finished = false;
            }
        }
        if finished {
            CardState::Finished
        } else if started {
            CardState::Ongoing
        } else {
            CardState::Idle
        }
    }

    /// Counts the questions answered correctly on the first attempt
    pub fn score(&self) -> usize {
        self.questions
            .values()
            .filter(|question| question.correct_on_first_attempt())
            .count()
    }

    /// Builds the one-line text export for this card
    ///
    /// The team identifier, a slash, then one export cell per question:
    /// `"2/A-C"` for team 2 with first guesses A, untouched, C.
    pub fn text_result(&self) -> String {
        let cells: String = self
            .questions
            .values()
            .map(Question::export_cell)
            .collect();
        format!("{}/{}", self.team, cells)
    }
}
