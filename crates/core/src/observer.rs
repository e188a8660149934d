//! Synchronous observer registry.
//!
//! Senders and receivers report what they see to subscribers registered in an
//! [`Observers`] registry. Delivery happens inside the call that produced the
//! event, in subscription order; nothing is queued.
//!
//! Subscribers implement [`ChannelObserver`], whose methods default to no-ops,
//! or pass a closure over [`Event`]:
//!
//! ```
//! use bitchannel_core::observer::{Event, Observers};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//!
//! let mut observers = Observers::new();
//! observers.subscribe(move |event: &Event| sink.borrow_mut().push(event.clone()));
//! observers.bit_observed(true);
//!
//! assert_eq!(seen.borrow().as_slice(), &[Event::BitObserved(true)]);
//! ```

use crate::error::DecodeIssue;

/// Which half of a frame a resolved word belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Position,
    Character,
}

/// A word that has been interpreted as a position or a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedField {
    pub kind: FieldKind,
    /// Position (0..=127) or content byte
    pub value: u8,
    /// The word as it appeared on the wire: `[payload, checksum]`
    pub raw: [u8; 2],
}

/// Everything an observer can be told, as a single value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    BitObserved(bool),
    FieldResolved(ResolvedField),
    MessageUpdated(String),
    Diagnostic(DecodeIssue),
}

/// Receives channel events. All methods default to doing nothing.
pub trait ChannelObserver {
    fn bit_observed(&mut self, _bit: bool) {}

    fn field_resolved(&mut self, _field: &ResolvedField) {}

    fn message_updated(&mut self, _message: &str) {}

    fn diagnostic(&mut self, _issue: &DecodeIssue) {}
}

impl<F> ChannelObserver for F
where
    F: FnMut(&Event),
{
    fn bit_observed(&mut self, bit: bool) {
        self(&Event::BitObserved(bit));
    }

    fn field_resolved(&mut self, field: &ResolvedField) {
        self(&Event::FieldResolved(*field));
    }

    fn message_updated(&mut self, message: &str) {
        self(&Event::MessageUpdated(message.to_owned()));
    }

    fn diagnostic(&mut self, issue: &DecodeIssue) {
        self(&Event::Diagnostic(*issue));
    }
}

/// Handle returned by [`Observers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered set of subscribers.
#[derive(Default)]
pub struct Observers {
    subscribers: Vec<(SubscriptionId, Box<dyn ChannelObserver>)>,
    next_id: u64,
}

impl Observers {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer; it receives events until unsubscribed.
    pub fn subscribe<O>(&mut self, observer: O) -> SubscriptionId
    where
        O: ChannelObserver + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Check if no observers are registered.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn bit_observed(&mut self, bit: bool) {
        for (_, observer) in &mut self.subscribers {
            observer.bit_observed(bit);
        }
    }

    pub fn field_resolved(&mut self, field: &ResolvedField) {
        for (_, observer) in &mut self.subscribers {
            observer.field_resolved(field);
        }
    }

    pub fn message_updated(&mut self, message: &str) {
        for (_, observer) in &mut self.subscribers {
            observer.message_updated(message);
        }
    }

    pub fn diagnostic(&mut self, issue: &DecodeIssue) {
        for (_, observer) in &mut self.subscribers {
            observer.diagnostic(issue);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
