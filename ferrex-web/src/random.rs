//! Stable shuffles that survive the trip from server to browser
//!
//! Pages that show a randomized list (featured items on the home page) get
//! one shuffle per page identifier. The server computes it, the payload
//! carries it, and the client renders the same order instead of
//! re-shuffling during hydration.

use std::collections::BTreeMap;

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::page::Page;

/// Shuffled item orderings keyed by page display name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RandomItemAssignment(BTreeMap<String, Vec<Value>>);

impl RandomItemAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shuffle the page's random items unless this page already has an
    /// ordering. Pages without random items are left out.
    pub fn assign_page(&mut self, page: &dyn Page) -> Option<&[Value]> {
        self.assign_page_with(page, &mut rand::rng())
    }

    pub fn assign_page_with<R>(&mut self, page: &dyn Page, rng: &mut R) -> Option<&[Value]>
    where
        R: Rng + ?Sized,
    {
        let items = page.random_items()?;
        let ordering = self
            .0
            .entry(page.display_name().to_owned())
            .or_insert_with(|| {
                let mut items = items;
                items.shuffle(rng);
                items
            });
        Some(ordering.as_slice())
    }

    pub fn get(&self, display_name: &str) -> Option<&[Value]> {
        self.0.get(display_name).map(Vec::as_slice)
    }

    pub fn insert(&mut self, display_name: impl Into<String>, items: Vec<Value>) {
        self.0.insert(display_name.into(), items);
    }

    pub fn contains(&self, display_name: &str) -> bool {
        self.0.contains_key(display_name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
