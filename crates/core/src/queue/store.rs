//! In-memory queue store.

use chrono::Utc;

use crate::ticket::{Ticket, TicketCode};

use super::types::{EntryState, QueueEntry, QueueError, QueueSnapshot};

/// Ordered waiting collection plus the append-only archive.
///
/// The current entry stays in the waiting collection at its queue position
/// while it is being served, so demoting it puts it back where it was.
#[derive(Debug, Clone, Default)]
pub struct QueueStore {
    entries: Vec<QueueEntry>,
    archive: Vec<QueueEntry>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new waiting entry and restore the ordering invariant.
    pub fn enroll(&mut self, ticket: Ticket) -> Result<(), QueueError> {
        if self.contains(&ticket.id) {
            return Err(QueueError::DuplicateEnrollment(ticket.id));
        }

        self.entries.push(QueueEntry::new(ticket));
        self.resort();
        Ok(())
    }

    /// Make `id` the current entry.
    ///
    /// Any previous current entry goes back to waiting. Returns `false` and
    /// changes nothing when `id` is not in the waiting collection.
    pub fn select_current(&mut self, id: &TicketCode) -> bool {
        let Some(target) = self.entries.iter().position(|e| e.ticket.id == *id) else {
            return false;
        };

        for entry in self.entries.iter_mut() {
            entry.state = EntryState::Waiting;
        }

        let entry = &mut self.entries[target];
        entry.state = EntryState::Current;
        entry.called_at = Some(Utc::now());
        true
    }

    /// Move the current entry to the end of the archive.
    ///
    /// Returns the archived entry, or `None` (changing nothing) when no entry
    /// is current.
    pub fn archive_current(&mut self) -> Option<QueueEntry> {
        let index = self.entries.iter().position(QueueEntry::is_current)?;
        let mut entry = self.entries.remove(index);
        entry.archived_at = Some(Utc::now());
        self.archive.push(entry.clone());
        Some(entry)
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            current: self.current().cloned(),
            waiting: self.waiting().cloned().collect(),
            archive: self.archive.clone(),
        }
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.entries.iter().find(|e| e.is_current())
    }

    /// Next entry to promote.
    pub fn head(&self) -> Option<&QueueEntry> {
        self.waiting().next()
    }

    /// Waiting entries in service order, excluding the current one.
    pub fn waiting(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter().filter(|e| !e.is_current())
    }

    pub fn get(&self, id: &TicketCode) -> Option<&QueueEntry> {
        self.entries.iter().find(|e| e.ticket.id == *id)
    }

    pub fn contains(&self, id: &TicketCode) -> bool {
        self.get(id).is_some()
    }

    pub fn archive(&self) -> &[QueueEntry] {
        &self.archive
    }

    /// Number of entries still in the waiting collection (current included).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // `sort_by_key` is stable, so same-class entries keep arrival order.
    fn resort(&mut self) {
        self.entries.sort_by_key(|e| e.ticket.priority_class.rank());
    }
}

#[cfg(test)]
impl QueueStore {
    /// Every entry still in the waiting collection, current included.
    pub(crate) fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }
}
