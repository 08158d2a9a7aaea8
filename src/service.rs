//! Request/response operations
//!
//! This module executes the operations the surrounding request layer
//! exposes: creating a test, grabbing a card, uncovering an alternative,
//! and the teacher's status and download views. Every mutation is a
//! single load, mutate, store unit against the injected persistence
//! gateway, serialized per document id so that racing requests observe
//! each other's writes. Grabbing in particular must be serialized: two
//! concurrent claims for the same team would otherwise both load an
//! ungrabbed session and both succeed.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use thiserror::Error;

use crate::{
    card::{self, Card, CardId},
    rat::{self, DownloadFormat, Rat, RatConfig, StatusRow},
    rat_id::{PrivateId, PublicId},
    store::Store,
    symbol::Symbol,
};

/// Errors surfaced to the request layer
///
/// All of these are expected outcomes of ordinary requests; none is
/// fatal to the process.
#[derive(Error, Debug)]
pub enum Error {
    /// No card is stored under that id.
    #[error("could not find card {0}")]
    CardNotFound(CardId),
    /// No test session is stored under that id.
    #[error("could not find that test")]
    RatNotFound,
    /// Creating the test failed validation.
    #[error(transparent)]
    Create(#[from] rat::CreateError),
    /// The grab was refused.
    #[error(transparent)]
    Grab(#[from] rat::GrabError),
    /// The uncover failed on the card.
    #[error(transparent)]
    Card(#[from] card::Error),
}

/// Executes domain operations against an injected store
///
/// The service keeps one mutex per document id and holds it across each
/// read-modify-write, which is what makes `grab` first-claim-wins under
/// concurrency. Backends with their own compare-and-swap could skip the
/// lock; the in-memory store has none, so the service provides it.
pub struct Service<S> {
    store: S,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: Store> Service<S> {
    /// Creates a service around a persistence gateway
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the lock guarding one document id
    ///
    /// # Panics
    ///
    /// Panics if the lock table mutex is poisoned, which only happens
    /// after another thread panicked while holding it.
    fn lock_for(&self, key: String) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .expect("lock table poisoned")
            .entry(key)
            .or_default()
            .clone()
    }

    /// Creates a test session and persists it with all its cards
    ///
    /// Cards are stored before the session so that a stored session
    /// always refers to cards that already exist; a half-created test is
    /// never observable.
    ///
    /// # Errors
    ///
    /// Returns the creation errors of [`Rat::create`].
    pub fn create_rat(&self, config: &RatConfig, creator: &str) -> Result<Rat, Error> {
        let (rat, cards) = Rat::create(config, creator)?;
        for card in &cards {
            self.store.store_card(card);
        }
        self.store.store_rat(&rat);
        tracing::debug!(public_id = %rat.public_id(), creator, "stored new test");
        Ok(rat)
    }

    /// Claims the card pre-assigned to a team; first claim wins
    ///
    /// # Errors
    ///
    /// Returns [`Error::RatNotFound`] for an unknown join code and the
    /// grab refusals of [`Rat::grab`].
    ///
    /// # Panics
    ///
    /// Panics if the per-session lock is poisoned.
    pub fn grab(&self, public_id: PublicId, team: &str) -> Result<CardId, Error> {
        let lock = self.lock_for(public_id.to_string());
        let _guard = lock.lock().expect("session lock poisoned");

        let mut rat = self
            .store
            .find_rat_by_public_id(public_id)
            .ok_or(Error::RatNotFound)?;
        let card_id = rat.grab(team)?;
        self.store.store_rat(&rat);
        Ok(card_id)
    }

    /// Looks up a card by its bookmark token
    ///
    /// # Errors
    ///
    /// Returns [`Error::CardNotFound`] if no card is stored under the id.
    pub fn card(&self, card_id: CardId) -> Result<Card, Error> {
        self.store
            .find_card(card_id)
            .ok_or(Error::CardNotFound(card_id))
    }

    /// Reveals one alternative on a stored card and persists the card
    ///
    /// Returns the updated card so the caller can render it without a
    /// second load.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CardNotFound`] for an unknown card and the
    /// uncover errors of [`Card::uncover`].
    ///
    /// # Panics
    ///
    /// Panics if the per-card lock is poisoned.
    pub fn uncover(
        &self,
        card_id: CardId,
        question: u32,
        alternative: Symbol,
    ) -> Result<Card, Error> {
        let lock = self.lock_for(card_id.to_string());
        let _guard = lock.lock().expect("card lock poisoned");

        let mut card = self
            .store
            .find_card(card_id)
            .ok_or(Error::CardNotFound(card_id))?;
        card.uncover(question, alternative)?;
        self.store.store_card(&card);
        tracing::debug!(%card_id, question, %alternative, "uncovered alternative");
        Ok(card)
    }

    /// Builds the teacher's status table for a session
    ///
    /// Cards that went missing from the store are skipped rather than
    /// failing the whole view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RatNotFound`] for an unknown teacher secret.
    pub fn status_rows(&self, private_id: PrivateId) -> Result<Vec<StatusRow>, Error> {
        let rat = self
            .store
            .find_rat_by_private_id(private_id)
            .ok_or(Error::RatNotFound)?;
        Ok(rat.status_rows(&self.cards_of(&rat)))
    }

    /// Builds the downloadable result document for a session
    ///
    /// # Errors
    ///
    /// Returns [`Error::RatNotFound`] for an unknown teacher secret.
    pub fn download(&self, private_id: PrivateId, format: DownloadFormat) -> Result<String, Error> {
        let rat = self
            .store
            .find_rat_by_private_id(private_id)
            .ok_or(Error::RatNotFound)?;
        Ok(rat.download(format, &self.cards_of(&rat)))
    }

    fn cards_of(&self, rat: &Rat) -> Vec<Card> {
        rat.card_ids_by_team()
            .values()
            .filter_map(|id| self.store.find_card(*id))
            .collect()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{card::CardState, rat::GrabError, store::MemoryStore};

    fn config() -> RatConfig {
        RatConfig {
            label: Some("History recap".to_owned()),
            teams: 3,
            questions: 4,
            alternatives: 4,
            solution: "BCAD".to_owned(),
        }
    }

    fn symbol(letter: char) -> Symbol {
        Symbol::try_from(letter).unwrap()
    }

    fn service() -> Service<MemoryStore> {
        Service::new(MemoryStore::new())
    }

    #[test]
    fn test_create_persists_session_and_cards() {
        let service = service();
        let rat = service.create_rat(&config(), "alice").unwrap();

        assert!(
            service
                .store()
                .find_rat_by_private_id(rat.private_id())
                .is_some()
        );
        for card_id in rat.card_ids_by_team().values() {
            assert!(service.store().find_card(*card_id).is_some());
        }
    }

    #[test]
    fn test_grab_returns_the_assigned_card() {
        let service = service();
        let rat = service.create_rat(&config(), "alice").unwrap();

        let card_id = service.grab(rat.public_id(), "1").unwrap();
        assert_eq!(rat.card_ids_by_team().get("1"), Some(&card_id));

        let reloaded = service
            .store()
            .find_rat_by_public_id(rat.public_id())
            .unwrap();
        assert!(reloaded.is_grabbed("1"));
    }

    #[test]
    fn test_second_grab_is_refused_and_persisted_state_survives() {
        let service = service();
        let rat = service.create_rat(&config(), "alice").unwrap();

        let first = service.grab(rat.public_id(), "1").unwrap();
        let second = service.grab(rat.public_id(), "1");
        assert!(matches!(
            second,
            Err(Error::Grab(GrabError::AlreadyGrabbed(_)))
        ));

        let other = service.grab(rat.public_id(), "2").unwrap();
        assert_ne!(other, first);
    }

    #[test]
    fn test_grab_unknown_session() {
        let service = service();
        assert!(matches!(
            service.grab(PublicId::new(), "1"),
            Err(Error::RatNotFound)
        ));
    }

    #[test]
    fn test_concurrent_grabs_for_same_team_have_one_winner() {
        let service = service();
        let rat = service.create_rat(&config(), "alice").unwrap();
        let public_id = rat.public_id();

        let results: Vec<Result<CardId, Error>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| service.grab(public_id, "1")))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });

        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|result| matches!(
                    result,
                    Err(Error::Grab(GrabError::AlreadyGrabbed(_)))
                ))
                .count(),
            3
        );
    }

    #[test]
    fn test_concurrent_grabs_for_different_teams_all_win() {
        let service = service();
        let rat = service.create_rat(&config(), "alice").unwrap();
        let public_id = rat.public_id();
        let service = &service;

        let results: Vec<Result<CardId, Error>> = std::thread::scope(|scope| {
            let handles: Vec<_> = ["1", "2", "3"]
                .into_iter()
                .map(|team| scope.spawn(move || service.grab(public_id, team)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });

        assert!(results.iter().all(Result::is_ok));
    }

    #[test]
    fn test_uncover_persists_the_card() {
        let service = service();
        let rat = service.create_rat(&config(), "alice").unwrap();
        let card_id = service.grab(rat.public_id(), "1").unwrap();

        let card = service.uncover(card_id, 1, symbol('B')).unwrap();
        assert!(card.question(1).unwrap().correct_on_first_attempt());

        let reloaded = service.card(card_id).unwrap();
        assert_eq!(reloaded.score(), 1);
        assert_eq!(reloaded.state(), CardState::Ongoing);
    }

    #[test]
    fn test_uncover_unknown_card() {
        let service = service();
        let missing = CardId::new();
        assert!(matches!(
            service.uncover(missing, 1, symbol('A')),
            Err(Error::CardNotFound(id)) if id == missing
        ));
    }

    #[test]
    fn test_status_rows_reflect_play() {
        let service = service();
        let rat = service.create_rat(&config(), "alice").unwrap();
        let card_id = service.grab(rat.public_id(), "2").unwrap();

        service.uncover(card_id, 1, symbol('A')).unwrap();
        service.uncover(card_id, 2, symbol('C')).unwrap();

        let rows = service.status_rows(rat.private_id()).unwrap();
        assert_eq!(rows.len(), 3);

        let row = rows.iter().find(|row| row.team == "2").unwrap();
        assert_eq!(row.state, CardState::Ongoing);
        assert_eq!(row.score, 1);
        assert_eq!(row.cells, vec!["A", "OK", "", ""]);
    }

    #[test]
    fn test_download_joins_card_lines() {
        let service = service();
        let rat = service.create_rat(&config(), "alice").unwrap();
        let card_id = service.grab(rat.public_id(), "1").unwrap();
        service.uncover(card_id, 1, symbol('B')).unwrap();

        let document = service
            .download(rat.private_id(), DownloadFormat::Text)
            .unwrap();
        let lines: Vec<&str> = document.lines().collect();
        assert_eq!(lines, vec!["1/B---", "2/----", "3/----"]);
    }

    #[test]
    fn test_views_with_unknown_private_id() {
        let service = service();
        assert!(matches!(
            service.status_rows(PrivateId::new()),
            Err(Error::RatNotFound)
        ));
        assert!(matches!(
            service.download(PrivateId::new(), DownloadFormat::Text),
            Err(Error::RatNotFound)
        ));
    }
}
