//! Persistence gateway
//!
//! This module defines the key-value contract the core uses to load and
//! save its aggregates. The core never talks to a database directly;
//! whatever backs a deployment (a document database, a cache, the
//! in-memory store below) implements this trait and is injected into
//! the [`crate::service::Service`].

use std::{
    collections::HashMap,
    sync::RwLock,
};

use crate::{
    card::{Card, CardId},
    rat::Rat,
    rat_id::{PrivateId, PublicId},
};

/// Key-value persistence for cards and test sessions
///
/// Stores are upserts keyed by the entity's id; storing the same entity
/// twice overwrites the previous document. Finds return owned copies so
/// callers mutate a snapshot and store it back as one unit.
pub trait Store {
    /// Looks up a card by its id
    fn find_card(&self, id: CardId) -> Option<Card>;

    /// Upserts a card keyed by its id
    fn store_card(&self, card: &Card);

    /// Looks up a test session by its student-facing code
    fn find_rat_by_public_id(&self, id: PublicId) -> Option<Rat>;

    /// Looks up a test session by its teacher secret
    fn find_rat_by_private_id(&self, id: PrivateId) -> Option<Rat>;

    /// Upserts a test session keyed by its private id
    fn store_rat(&self, rat: &Rat);
}

/// In-memory store implementation
///
/// Backs the contract with hash maps behind read-write locks. Suitable
/// for tests and single-process deployments that accept losing state on
/// restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    cards: RwLock<HashMap<CardId, Card>>,
    rats: RwLock<HashMap<PrivateId, Rat>>,
    public_to_private: RwLock<HashMap<PublicId, PrivateId>>,
}

impl MemoryStore {
    /// Creates an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn find_card(&self, id: CardId) -> Option<Card> {
        self.cards
            .read()
            .expect("card table lock poisoned")
            .get(&id)
            .cloned()
    }

    fn store_card(&self, card: &Card) {
        self.cards
            .write()
            .expect("card table lock poisoned")
            .insert(card.id(), card.clone());
    }

    fn find_rat_by_public_id(&self, id: PublicId) -> Option<Rat> {
        let private_id = *self
            .public_to_private
            .read()
            .expect("public id table lock poisoned")
            .get(&id)?;
        self.find_rat_by_private_id(private_id)
    }

    fn find_rat_by_private_id(&self, id: PrivateId) -> Option<Rat> {
        self.rats
            .read()
            .expect("rat table lock poisoned")
            .get(&id)
            .cloned()
    }

    fn store_rat(&self, rat: &Rat) {
        self.public_to_private
            .write()
            .expect("public id table lock poisoned")
            .insert(rat.public_id(), rat.private_id());
        self.rats
            .write()
            .expect("rat table lock poisoned")
            .insert(rat.private_id(), rat.clone());
    }
}
