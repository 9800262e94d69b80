//! Subscription bookkeeping.
//!
//! Tracks what the session has subscribed to and in which mode, so a
//! revocation can be checked locally before it reaches the wire.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::error::{Error, ErrorCode, Result};
use crate::identifiers::{BrowsingContextId, SubscriptionId};

// ============================================================================
// Types
// ============================================================================

/// How a subscription must be revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionMode {
    /// Revoked with the same event and context list.
    ByAttributes,
    /// Revoked with the id the remote end returned.
    ById,
}

/// One successful `session.subscribe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Id issued by the remote end, if any.
    pub id: Option<SubscriptionId>,
    /// Subscribed event methods or module names.
    pub events: BTreeSet<String>,
    /// Context scope; `None` means global.
    pub contexts: Option<BTreeSet<BrowsingContextId>>,
    /// Revocation mode.
    pub mode: SubscriptionMode,
}

impl Subscription {
    fn matches_attributes(
        &self,
        events: &BTreeSet<String>,
        contexts: Option<&BTreeSet<BrowsingContextId>>,
    ) -> bool {
        self.events == *events && self.contexts.as_ref() == contexts
    }
}

// ============================================================================
// SubscriptionSet
// ============================================================================

/// Subscriptions owned by an active session.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    entries: Vec<Subscription>,
}

impl SubscriptionSet {
    /// Records a subscription. An attribute-mode entry identical to one
    /// already recorded is not added twice; returns `false` in that case.
    pub fn insert(&mut self, subscription: Subscription) -> bool {
        if subscription.mode == SubscriptionMode::ByAttributes
            && self
                .find_attribute_entry(&subscription.events, subscription.contexts.as_ref())
                .is_some()
        {
            return false;
        }
        self.entries.push(subscription);
        true
    }

    /// Returns the attribute-mode entry with exactly these attributes.
    #[must_use]
    pub fn find_attribute_entry(
        &self,
        events: &BTreeSet<String>,
        contexts: Option<&BTreeSet<BrowsingContextId>>,
    ) -> Option<&Subscription> {
        self.attribute_position(events, contexts)
            .map(|index| &self.entries[index])
    }

    fn attribute_position(
        &self,
        events: &BTreeSet<String>,
        contexts: Option<&BTreeSet<BrowsingContextId>>,
    ) -> Option<usize> {
        self.entries.iter().position(|s| {
            s.mode == SubscriptionMode::ByAttributes && s.matches_attributes(events, contexts)
        })
    }

    /// Returns the recorded subscriptions.
    #[must_use]
    pub fn entries(&self) -> &[Subscription] {
        &self.entries
    }

    /// Returns `true` if nothing is subscribed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of subscriptions.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if some subscription covers `method`, either by name or
    /// by its module.
    #[must_use]
    pub fn covers(&self, method: &str) -> bool {
        let module = method.split_once('.').map_or(method, |(module, _)| module);
        self.entries
            .iter()
            .any(|s| s.events.contains(method) || s.events.contains(module))
    }

    /// Finds the attribute-mode subscription an unsubscribe would revoke.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] with [`ErrorCode::InvalidArgument`] if no
    /// subscription has exactly these attributes, or if the matching one was
    /// created by id.
    pub fn find_by_attributes(
        &self,
        events: &BTreeSet<String>,
        contexts: Option<&BTreeSet<BrowsingContextId>>,
    ) -> Result<usize> {
        if let Some(index) = self.attribute_position(events, contexts) {
            return Ok(index);
        }

        if self
            .entries
            .iter()
            .any(|s| s.matches_attributes(events, contexts))
        {
            Err(rejected(
                "subscription was created by id and must be revoked by id",
            ))
        } else {
            Err(rejected("no subscription matches these events and contexts"))
        }
    }

    /// Finds the id-mode subscriptions an unsubscribe would revoke.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] with [`ErrorCode::InvalidArgument`] if an id is
    /// unknown or belongs to an attribute-mode subscription.
    pub fn find_by_ids(&self, ids: &[SubscriptionId]) -> Result<Vec<usize>> {
        ids.iter()
            .map(|id| {
                let index = self
                    .entries
                    .iter()
                    .position(|s| s.id.as_ref() == Some(id))
                    .ok_or_else(|| rejected(format!("unknown subscription {id}")))?;

                match self.entries[index].mode {
                    SubscriptionMode::ById => Ok(index),
                    SubscriptionMode::ByAttributes => Err(rejected(format!(
                        "subscription {id} was created by attributes and must be revoked by attributes"
                    ))),
                }
            })
            .collect()
    }

    /// Removes entries by index.
    pub fn remove_indices(&mut self, mut indices: Vec<usize>) {
        indices.sort_unstable();
        indices.dedup();
        for index in indices.into_iter().rev() {
            if index < self.entries.len() {
                self.entries.remove(index);
            }
        }
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn rejected(message: impl Into<String>) -> Error {
    Error::protocol(ErrorCode::InvalidArgument, message, None)
}

// ============================================================================
// Tests
// ============================================================================
