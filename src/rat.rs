//! Test sessions
//!
//! This module implements the test session aggregate: the teacher's
//! creation parameters and their validation, the one-time assignment of
//! scratch cards to teams, the first-claim-wins grab, and the
//! teacher-facing status and download views. A session holds its cards
//! by id only; the cards themselves are separately addressable documents
//! fetched through the persistence gateway.

use std::collections::{BTreeMap, BTreeSet};

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    card::{Card, CardId, CardState},
    constants, palette,
    question::Question,
    rat_id::{PrivateId, PublicId},
    symbol::Symbol,
};

/// Parameters a teacher supplies when creating a test
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RatConfig {
    /// Display label; a missing label falls back to the default
    #[garde(inner(length(max = constants::rat::MAX_LABEL_LENGTH)))]
    pub label: Option<String>,
    /// Number of teams taking the test
    #[garde(range(min = 1))]
    pub teams: usize,
    /// Number of questions on the test
    #[garde(range(min = 1, max = constants::rat::MAX_QUESTIONS))]
    pub questions: usize,
    /// Number of alternatives per question
    #[garde(range(
        min = constants::rat::MIN_ALTERNATIVES,
        max = constants::rat::MAX_ALTERNATIVES
    ))]
    pub alternatives: usize,
    /// The correct alternative letters, one per question
    #[garde(skip)]
    pub solution: String,
}

/// Ways a solution string can disagree with the test parameters
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionError {
    /// The solution does not provide one letter per question.
    #[error("{questions} questions need {questions} solution letters, got {letters}")]
    Length {
        /// How many questions the test has
        questions: usize,
        /// How many letters the solution provided
        letters: usize,
    },
    /// A letter lies outside the configured alternative range.
    #[error("the letter {letter} is not a valid solution with {alternatives} alternatives")]
    Letter {
        /// The offending letter
        letter: char,
        /// The configured alternative count
        alternatives: usize,
    },
}

/// Errors that can occur when creating a test
#[derive(Error, Debug)]
pub enum CreateError {
    /// A creation parameter lies outside its bounds.
    #[error(transparent)]
    InvalidConfig(#[from] garde::Report),
    /// The solution string disagrees with the test parameters.
    #[error("invalid solution: {0}")]
    InvalidSolution(#[from] SolutionError),
    /// The team count exceeds the distinct-color palette.
    #[error(transparent)]
    InsufficientColors(#[from] palette::InsufficientColors),
}

/// Errors that can stop a team from grabbing its card
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrabError {
    /// First claim wins; later grabs for the same team are refused.
    #[error("somebody already grabbed the card of team {0}")]
    AlreadyGrabbed(String),
    /// The team is not part of this test.
    #[error("team {0} is not part of this test")]
    UnknownTeam(String),
}

/// Checks a solution string against the question and alternative counts
///
/// Every letter must name one of the first `alternatives` symbols,
/// matched case-insensitively, and there must be exactly one letter per
/// question. Callers run this before creating anything so that no
/// partially built test is ever observable.
///
/// # Errors
///
/// Returns the first [`SolutionError`] encountered.
pub fn validate_solution(
    solution: &str,
    questions: usize,
    alternatives: usize,
) -> Result<(), SolutionError> {
    let letters = solution.chars().count();
    if letters != questions {
        return Err(SolutionError::Length { questions, letters });
    }
    for letter in solution.chars() {
        let valid = Symbol::try_from(letter)
            .is_ok_and(|symbol| Symbol::alphabet(alternatives).contains(&symbol));
        if !valid {
            return Err(SolutionError::Letter {
                letter,
                alternatives,
            });
        }
    }
    Ok(())
}

/// One teacher-facing row of the status table
///
/// Plain data only; turning rows into markup is the rendering layer's
/// job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRow {
    /// The team this row describes
    pub team: String,
    /// The team's card, so the row can link to it
    pub card: CardId,
    /// Aggregate card state
    pub state: CardState,
    /// First-attempt score
    pub score: usize,
    /// One scoreboard cell per question
    pub cells: Vec<String>,
}

/// Formats the teacher can download results in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadFormat {
    /// One line per card: team, slash, first guesses
    Text,
}

/// Error returned when a download format token is not recognized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown download format {0:?}")]
pub struct ParseDownloadFormatError(String);

impl std::str::FromStr for DownloadFormat {
    type Err = ParseDownloadFormatError;

    /// Parses the format token used in download URLs
    ///
    /// # Errors
    ///
    /// Returns [`ParseDownloadFormatError`] for unrecognized tokens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" | "text" => Ok(Self::Text),
            other => Err(ParseDownloadFormatError(other.to_owned())),
        }
    }
}

/// One test session shared by all its teams
///
/// The card assignment is fixed at creation: every team has its card id
/// before the session is ever stored. Grabbing only reveals the
/// pre-assigned id to the first claimant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rat {
    /// Teacher-only secret token
    private_id: PrivateId,
    /// Student-facing join code
    public_id: PublicId,
    /// Display label
    label: String,
    /// Number of teams
    teams: usize,
    /// Number of questions
    questions: usize,
    /// Number of alternatives per question
    alternatives: usize,
    /// The correct alternative letters
    solution: String,
    /// One distinct color per team, indexed by team number minus one
    team_colors: Vec<String>,
    /// Card ids keyed by team identifier, fixed at creation
    card_ids_by_team: BTreeMap<String, CardId>,
    /// Teams that have already claimed their card
    grabbed_rats: BTreeSet<String>,
    /// Identity of the creating teacher
    creator: String,
}

impl Rat {
    /// Creates a test session together with one card per team
    ///
    /// Validates the parameters and the solution, draws distinct team
    /// colors, generates the id pair, and builds the cards. The returned
    /// session already maps every team to its card id; the caller stores
    /// the cards first and the session last so a stored session always
    /// refers to stored cards.
    ///
    /// # Errors
    ///
    /// Returns [`CreateError::InvalidConfig`] for parameters outside
    /// their bounds, [`CreateError::InvalidSolution`] if the solution
    /// disagrees with the question or alternative count, and
    /// [`CreateError::InsufficientColors`] if there are more teams than
    /// palette colors.
    pub fn create(
        config: &RatConfig,
        creator: impl Into<String>,
    ) -> Result<(Self, Vec<Card>), CreateError> {
        config.validate()?;
        validate_solution(&config.solution, config.questions, config.alternatives)?;
        let team_colors = palette::pick_colors(config.teams)?;

        let label = config
            .label
            .clone()
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| constants::card::DEFAULT_LABEL.to_owned());
        let private_id = PrivateId::new();
        let public_id = PublicId::new();

        let mut cards = Vec::with_capacity(config.teams);
        let mut card_ids_by_team = BTreeMap::new();
        for team in 1..=config.teams {
            let card = Card::new(
                Some(label.clone()),
                team.to_string(),
                config.questions,
                config.alternatives,
                &config.solution,
                team_colors[team - 1].clone(),
            )
            .expect("solution already validated against the question count");
            card_ids_by_team.insert(team.to_string(), card.id());
            cards.push(card);
        }

        tracing::debug!(
            %public_id,
            %label,
            teams = config.teams,
            questions = config.questions,
            alternatives = config.alternatives,
            "created new test"
        );

        Ok((
            Self {
                private_id,
                public_id,
                label,
                teams: config.teams,
                questions: config.questions,
                alternatives: config.alternatives,
                solution: config.solution.clone(),
                team_colors,
                card_ids_by_team,
                grabbed_rats: BTreeSet::new(),
                creator: creator.into(),
            },
            cards,
        ))
    }

    /// Claims the card pre-assigned to a team
    ///
    /// The first claim for a team wins and marks the team as grabbed;
    /// every later claim for the same team is refused, including retries
    /// by the team itself. The transition is pure; the caller persists
    /// the session afterward and serializes concurrent grabs per session
    /// so two claims for the same team cannot both observe it ungrabbed.
    ///
    /// # Errors
    ///
    /// Returns [`GrabError::UnknownTeam`] for a team outside this test
    /// and [`GrabError::AlreadyGrabbed`] if the team's card was already
    /// claimed. Neither error changes any state.
    pub fn grab(&mut self, team: &str) -> Result<CardId, GrabError> {
        let card_id = *self
            .card_ids_by_team
            .get(team)
            .ok_or_else(|| GrabError::UnknownTeam(team.to_owned()))?;
        if !self.grabbed_rats.insert(team.to_owned()) {
            return Err(GrabError::AlreadyGrabbed(team.to_owned()));
        }
        tracing::debug!(public_id = %self.public_id, team, %card_id, "team grabbed its card");
        Ok(card_id)
    }

    /// Builds the teacher-facing status table rows
    ///
    /// One row per card in the order given: team, card state, score, and
    /// one scoreboard cell per question.
    pub fn status_rows(&self, cards: &[Card]) -> Vec<StatusRow> {
        cards
            .iter()
            .map(|card| StatusRow {
                team: card.team().to_owned(),
                card: card.id(),
                state: card.state(),
                score: card.score(),
                cells: card.questions().map(Question::state_cell).collect(),
            })
            .collect_vec()
    }

    /// Returns the status table column headers
    ///
    /// `Team`, `Status`, `Score`, then one numbered column per question.
    pub fn status_headers(&self) -> Vec<String> {
        ["Team", "Status", "Score"]
            .into_iter()
            .map(str::to_owned)
            .chain((1..=self.questions).map(|number| number.to_string()))
            .collect_vec()
    }

    /// Builds the downloadable result document
    ///
    /// The text format joins each card's one-line result with newlines.
    /// Serving the string as a file is the transport layer's concern.
    pub fn download(&self, format: DownloadFormat, cards: &[Card]) -> String {
        match format {
            DownloadFormat::Text => cards.iter().map(Card::text_result).join("\n"),
        }
    }

    /// Returns the teacher-only secret token
    pub fn private_id(&self) -> PrivateId {
        self.private_id
    }

    /// Returns the student-facing join code
    pub fn public_id(&self) -> PublicId {
        self.public_id
    }

    /// Returns the display label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the number of teams
    pub fn teams(&self) -> usize {
        self.teams
    }

    /// Returns the number of questions
    pub fn questions(&self) -> usize {
        self.questions
    }

    /// Returns the number of alternatives per question
    pub fn alternatives(&self) -> usize {
        self.alternatives
    }

    /// Returns the solution string
    pub fn solution(&self) -> &str {
        &self.solution
    }

    /// Returns the team colors, indexed by team number minus one
    pub fn team_colors(&self) -> &[String] {
        &self.team_colors
    }

    /// Returns the card assignment fixed at creation
    pub fn card_ids_by_team(&self) -> &BTreeMap<String, CardId> {
        &self.card_ids_by_team
    }

    /// Returns whether a team has already claimed its card
    pub fn is_grabbed(&self, team: &str) -> bool {
        self.grabbed_rats.contains(team)
    }

    /// Returns the identity of the creating teacher
    pub fn creator(&self) -> &str {
        &self.creator
    }
}
