//! Ticket arena, path index and pending queue
//!
//! Tickets live in one arena indexed by item path. The pending queue holds
//! arena indices; claiming a ticket pops it from the queue and marks it
//! `InProgress` under the same lock, so no two workers ever own one ticket.

use crate::ticket::{TransferOutcome, TransferTicket};
use artifact_types::{ArtifactItem, ProgressEvent, TicketState};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Handle to a ticket in a [`TicketStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicketId(usize);

#[derive(Debug, Default)]
struct StoreInner {
    tickets: Vec<TransferTicket>,
    index: HashMap<String, usize>,
    queue: VecDeque<usize>,
}

/// Shared ticket store for one run
#[derive(Debug, Default)]
pub struct TicketStore {
    inner: Mutex<StoreInner>,
}

impl TicketStore {
    /// Create a store with one pending ticket per item, queued in listing order.
    ///
    /// A repeated path keeps the first item.
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = ArtifactItem>,
    {
        let mut inner = StoreInner::default();
        for item in items {
            if inner.index.contains_key(item.path()) {
                continue;
            }
            let idx = inner.tickets.len();
            inner.index.insert(item.path().to_string(), idx);
            inner.tickets.push(TransferTicket::new(item));
            inner.queue.push_back(idx);
        }

        Self {
            inner: Mutex::new(inner),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of tickets
    pub fn len(&self) -> usize {
        self.lock().tickets.len()
    }

    /// True when the store holds no tickets
    pub fn is_empty(&self) -> bool {
        self.lock().tickets.is_empty()
    }

    /// Number of tickets still waiting in the queue
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Pop the next pending ticket and mark it `InProgress`
    pub fn claim_next(&self) -> Option<(TicketId, ArtifactItem)> {
        let mut inner = self.lock();
        let idx = inner.queue.pop_front()?;
        let ticket = &mut inner.tickets[idx];
        ticket.start();
        Some((TicketId(idx), ticket.item.clone()))
    }

    /// Count a retry on a claimed ticket
    pub fn record_retry(&self, id: TicketId) -> ProgressEvent {
        let mut inner = self.lock();
        let ticket = &mut inner.tickets[id.0];
        ticket.record_retry();
        event_for(ticket)
    }

    /// Mark a claimed ticket as processed
    pub fn complete(&self, id: TicketId, outcome: TransferOutcome) -> ProgressEvent {
        let mut inner = self.lock();
        let ticket = &mut inner.tickets[id.0];
        ticket.complete(outcome);
        event_for(ticket)
    }

    /// Mark a claimed ticket as failed
    pub fn fail(&self, id: TicketId, message: impl Into<String>) -> ProgressEvent {
        let mut inner = self.lock();
        let ticket = &mut inner.tickets[id.0];
        ticket.fail(message);
        event_for(ticket)
    }

    /// Drain the queue, marking every still-pending ticket `Skipped`
    pub fn skip_pending(&self) -> Vec<ProgressEvent> {
        let mut inner = self.lock();
        let StoreInner { tickets, queue, .. } = &mut *inner;
        queue
            .drain(..)
            .map(|idx| {
                let ticket = &mut tickets[idx];
                ticket.skip();
                event_for(ticket)
            })
            .collect()
    }

    /// Fail every ticket left `InProgress`, returning their events
    pub fn fail_in_progress(&self, message: &str) -> Vec<ProgressEvent> {
        let mut inner = self.lock();
        inner
            .tickets
            .iter_mut()
            .filter(|ticket| ticket.state == TicketState::InProgress)
            .map(|ticket| {
                ticket.fail(message);
                event_for(ticket)
            })
            .collect()
    }

    /// Copy of the ticket for a path
    pub fn get(&self, path: &str) -> Option<TransferTicket> {
        let inner = self.lock();
        inner.index.get(path).map(|&idx| inner.tickets[idx].clone())
    }

    /// Copy of every ticket, in listing order
    pub fn snapshot(&self) -> Vec<TransferTicket> {
        self.lock().tickets.clone()
    }
}

fn event_for(ticket: &TransferTicket) -> ProgressEvent {
    ProgressEvent::new(ticket.path(), ticket.state, ticket.attempt)
}
