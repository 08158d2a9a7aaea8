//! Question uncover state machine
//!
//! This module implements a single multiple-choice question on a scratch
//! card. A question owns one [`AnswerState`] per alternative and derives
//! its own status from uncover events: `started` latches on the first
//! uncover, `finished` latches when the correct alternative is revealed,
//! and `correct_on_first_attempt` records whether the very first guess
//! was the correct one. All three flags are monotonic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::symbol::Symbol;

/// One selectable alternative of a question
///
/// Whether the alternative is correct is fixed at creation; `uncovered`
/// flips to true on the first reveal and never reverts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerState {
    /// The letter identifying this alternative
    symbol: Symbol,
    /// Whether this is the correct alternative
    correct: bool,
    /// Whether this alternative has been revealed
    uncovered: bool,
}

impl AnswerState {
    fn new(symbol: Symbol, correct: bool) -> Self {
        Self {
            symbol,
            correct,
            uncovered: false,
        }
    }

    /// Returns the letter identifying this alternative
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// Returns whether this is the correct alternative
    pub fn is_correct(&self) -> bool {
        self.correct
    }

    /// Returns whether this alternative has been revealed
    pub fn is_uncovered(&self) -> bool {
        self.uncovered
    }
}

/// Errors that can occur when uncovering an alternative
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The symbol is not part of this question's alternative set.
    #[error("alternative {0} is not on this question")]
    InvalidAlternative(Symbol),
}

/// One multiple-choice question on a scratch card
///
/// Questions are numbered from 1 within their card. The answer map is
/// keyed by symbol and ordered, so rendering enumerates alternatives in
/// a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// 1-based position within the card
    number: u32,
    /// Whether the correct alternative has been revealed
    finished: bool,
    /// Whether any alternative has been revealed
    started: bool,
    /// Whether the first-ever guess hit the correct alternative
    correct_on_first_attempt: bool,
    /// The first alternative ever uncovered, if any
    first_guess: Option<Symbol>,
    /// Alternative states keyed by their symbol
    answers: BTreeMap<Symbol, AnswerState>,
}

impl Question {
    /// Creates a fresh, unstarted question
    ///
    /// Builds one [`AnswerState`] per alternative; the one whose symbol
    /// matches `correct_alternative` (case-insensitively) is marked
    /// correct.
    pub fn new(number: u32, correct_alternative: char, alternatives: usize) -> Self {
        let answers = Symbol::alphabet(alternatives)
            .map(|symbol| {
                let correct = symbol.as_char().eq_ignore_ascii_case(&correct_alternative);
                (symbol, AnswerState::new(symbol, correct))
            })
            .collect();
        Self {
            number,
            finished: false,
            started: false,
            correct_on_first_attempt: false,
            first_guess: None,
            answers,
        }
    }

    /// Reveals one alternative
    ///
    /// The first uncover ever records the guess and, if it was correct,
    /// the first-attempt score. Revealing the correct alternative at any
    /// point finishes the question. Re-uncovering an already revealed
    /// alternative is a no-op that does not re-trigger the first-attempt
    /// bookkeeping, and uncovering after the question is finished stays
    /// allowed so teams can reveal the remaining tiles for review.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlternative`] if the symbol is not part of
    /// this question's alternative set.
    pub fn uncover(&mut self, alternative: Symbol) -> Result<(), Error> {
        let answer = self
            .answers
            .get_mut(&alternative)
            .ok_or(Error::InvalidAlternative(alternative))?;
        answer.uncovered = true;
        let correct = answer.correct;
        if !self.started {
            self.first_guess = Some(alternative);
            if correct {
                self.correct_on_first_attempt = true;
            }
        }
        if correct {
            self.finished = true;
        }
        self.started = true;
        Ok(())
    }

    /// Returns the 1-based position of this question within its card
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Returns whether the correct alternative has been revealed
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns whether any alternative has been revealed
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Returns whether the first guess hit the correct alternative
    pub fn correct_on_first_attempt(&self) -> bool {
        self.correct_on_first_attempt
    }

    /// Returns the first alternative ever uncovered, if any
    pub fn first_guess(&self) -> Option<Symbol> {
        self.first_guess
    }

    /// Returns the alternative states in symbol order
    pub fn answers(&self) -> impl Iterator<Item = &AnswerState> {
        self.answers.values()
    }

    /// Looks up one alternative state by symbol
    pub fn answer(&self, symbol: Symbol) -> Option<&AnswerState> {
        self.answers.get(&symbol)
    }

    /// Returns the compact scoreboard cell for this question
    ///
    /// `"OK"` if the first attempt was correct, the first-guess letter if
    /// the team has started guessing, and empty otherwise.
    pub fn state_cell(&self) -> String {
        if self.correct_on_first_attempt {
            "OK".to_owned()
        } else if let Some(guess) = self.first_guess {
            guess.to_string()
        } else {
            String::new()
        }
    }

    /// Returns the flat-file export cell for this question
    ///
    /// The first-guess letter if the team has started guessing, `"-"`
    /// otherwise.
    pub fn export_cell(&self) -> String {
        self.first_guess
            .map_or_else(|| "-".to_owned(), |guess| guess.to_string())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn symbol(letter: char) -> Symbol {
        Symbol::try_from(letter).unwrap()
    }

    #[test]
    fn test_new_question_is_unstarted() {
        let question = Question::new(1, 'B', 4);
        assert!(!question.is_started());
        assert!(!question.is_finished());
        assert!(!question.correct_on_first_attempt());
        assert_eq!(question.first_guess(), None);
        assert_eq!(question.answers().count(), 4);
    }

    #[test]
    fn test_exactly_one_correct_answer() {
        let question = Question::new(1, 'c', 8);
        let correct: Vec<Symbol> = question
            .answers()
            .filter(|a| a.is_correct())
            .map(AnswerState::symbol)
            .collect();
        assert_eq!(correct, vec![symbol('C')]);
    }

    #[test]
    fn test_wrong_first_guess_then_correct() {
        let mut question = Question::new(1, 'B', 4);

        question.uncover(symbol('A')).unwrap();
        assert!(question.is_started());
        assert_eq!(question.first_guess(), Some(symbol('A')));
        assert!(!question.correct_on_first_attempt());
        assert!(!question.is_finished());

        question.uncover(symbol('B')).unwrap();
        assert!(question.is_finished());
        assert_eq!(question.first_guess(), Some(symbol('A')));
        assert!(!question.correct_on_first_attempt());
    }

    #[test]
    fn test_correct_first_guess() {
        let mut question = Question::new(2, 'C', 4);

        question.uncover(symbol('C')).unwrap();
        assert!(question.is_started());
        assert!(question.is_finished());
        assert!(question.correct_on_first_attempt());
        assert_eq!(question.first_guess(), Some(symbol('C')));
    }

    #[test]
    fn test_uncover_invalid_alternative() {
        let mut question = Question::new(1, 'A', 4);
        assert_eq!(
            question.uncover(symbol('E')),
            Err(Error::InvalidAlternative(symbol('E')))
        );
        assert!(!question.is_started());
    }

    #[test]
    fn test_re_uncover_does_not_refire_bookkeeping() {
        let mut question = Question::new(1, 'B', 4);

        question.uncover(symbol('B')).unwrap();
        assert!(question.correct_on_first_attempt());

        question.uncover(symbol('A')).unwrap();
        question.uncover(symbol('B')).unwrap();
        assert_eq!(question.first_guess(), Some(symbol('B')));
        assert!(question.correct_on_first_attempt());
    }

    #[test]
    fn test_finished_is_monotonic() {
        let mut question = Question::new(1, 'A', 4);
        question.uncover(symbol('A')).unwrap();
        assert!(question.is_finished());

        for letter in ['B', 'C', 'D', 'A'] {
            question.uncover(symbol(letter)).unwrap();
            assert!(question.is_finished());
        }
    }

    #[test]
    fn test_uncover_after_finished_reveals_tiles() {
        let mut question = Question::new(1, 'A', 4);
        question.uncover(symbol('A')).unwrap();
        question.uncover(symbol('D')).unwrap();

        assert!(question.answer(symbol('D')).unwrap().is_uncovered());
        assert!(question.correct_on_first_attempt());
    }

    #[test]
    fn test_state_cell() {
        let mut question = Question::new(1, 'B', 4);
        assert_eq!(question.state_cell(), "");

        question.uncover(symbol('A')).unwrap();
        assert_eq!(question.state_cell(), "A");

        let mut nailed = Question::new(2, 'C', 4);
        nailed.uncover(symbol('C')).unwrap();
        assert_eq!(nailed.state_cell(), "OK");
    }

    #[test]
    fn test_export_cell() {
        let mut question = Question::new(1, 'B', 4);
        assert_eq!(question.export_cell(), "-");

        question.uncover(symbol('D')).unwrap();
        assert_eq!(question.export_cell(), "D");
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut question = Question::new(3, 'b', 5);
        question.uncover(symbol('A')).unwrap();
        question.uncover(symbol('B')).unwrap();

        let serialized = serde_json::to_string(&question).unwrap();
        let deserialized: Question = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, question);
    }

    #[test]
    fn test_answers_serialize_keyed_by_symbol() {
        let question = Question::new(1, 'A', 4);
        let value = serde_json::to_value(&question).unwrap();
        let answers = value.get("answers").unwrap().as_object().unwrap();
        let keys: Vec<&String> = answers.keys().collect();
        assert_eq!(keys, vec!["A", "B", "C", "D"]);
    }
}
