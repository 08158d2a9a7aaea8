//! Configuration constants for the test system
//!
//! This module contains the configuration limits and constraints used
//! throughout the domain model to ensure data integrity and provide
//! consistent boundaries for test creation.

/// Test session configuration constants
pub mod rat {
    /// Fewest alternatives a question can offer
    pub const MIN_ALTERNATIVES: usize = 4;
    /// Most alternatives a question can offer
    pub const MAX_ALTERNATIVES: usize = 8;
    /// Maximum number of questions on a single test
    pub const MAX_QUESTIONS: usize = 100;
    /// Maximum length of a test label in characters
    pub const MAX_LABEL_LENGTH: usize = 200;
    /// Number of letters in the student-facing join code
    pub const PUBLIC_ID_LENGTH: usize = 5;
}

/// Scratch card configuration constants
pub mod card {
    /// Label used when the teacher does not provide one
    pub const DEFAULT_LABEL: &str = "Team Quiz";
}
