//! Queue store
//!
//! Owns the ordered sequence of entries and the cursor naming the current
//! one. Every mutation is applied completely or rejected without touching
//! the queue, and returns the resulting snapshot with a change descriptor.
//!
//! ```text
//!   index:   0      1      2      3
//!          [ A ]  [ B ]  [ C ]  [ D ]
//!                   ^
//!                 cursor (current = B)
//! ```
//!
//! Cursor rules:
//! - it is `None` or a valid index
//! - removing before the cursor shifts it so it keeps naming the same entry
//! - removing the current entry makes the following entry current, or
//!   `None` when there is none
//! - inserting never changes the current entry unless the position is `Now`
//!   or the queue was empty

use crate::error::{PlaybackError, Result};
use crate::shuffle::Shuffler;
use crate::types::{
    EnqueuePosition, EntryId, QueueChange, QueueChangeKind, QueueEntry, QueueItem, QueueSnapshot,
    QueueUpdate,
};

#[derive(Debug, Clone)]
pub struct QueueStore {
    entries: Vec<QueueEntry>,
    cursor: Option<usize>,
    next_id: u64,
    shuffler: Shuffler,
}

impl QueueStore {
    /// Empty queue shuffling from OS entropy
    pub fn new() -> Self {
        Self::with_shuffler(Shuffler::from_entropy())
    }

    /// Empty queue with an explicit shuffle source
    pub fn with_shuffler(shuffler: Shuffler) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            next_id: 1,
            shuffler,
        }
    }

    // ===== Mutations =====

    /// Enqueue a single item
    pub fn enqueue(&mut self, item: QueueItem, position: EnqueuePosition) -> QueueUpdate {
        self.insert_block(vec![item], position)
    }

    /// Enqueue many items at once, optionally shuffled before insertion
    ///
    /// The items land as one contiguous block at `position`. When the queue
    /// was empty the first item of the block becomes current.
    pub fn enqueue_many(
        &mut self,
        mut items: Vec<QueueItem>,
        shuffle: bool,
        position: EnqueuePosition,
    ) -> QueueUpdate {
        if shuffle {
            self.shuffler.shuffle(&mut items);
        }
        self.insert_block(items, position)
    }

    /// Remove the entry at `index`
    pub fn remove_at(&mut self, index: usize) -> Result<QueueUpdate> {
        let len = self.entries.len();
        if index >= len {
            return Err(PlaybackError::IndexOutOfRange { index, len });
        }

        self.entries.remove(index);

        self.cursor = match self.cursor {
            Some(cursor) if index < cursor => Some(cursor - 1),
            // The following entry slid into the cursor slot
            Some(cursor) if index == cursor => (cursor < self.entries.len()).then_some(cursor),
            other => other,
        };

        Ok(self.update(QueueChangeKind::Removed, vec![index]))
    }

    /// Move the entry at `from` so that it ends up at index `to`
    ///
    /// The current entry stays current; only its index is recomputed.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<QueueUpdate> {
        let len = self.entries.len();
        if from >= len || to >= len {
            return Err(PlaybackError::InvalidMove { from, to, len });
        }

        if from != to {
            let entry = self.entries.remove(from);
            self.entries.insert(to, entry);

            self.cursor = self.cursor.map(|cursor| {
                if cursor == from {
                    to
                } else if from < cursor && cursor <= to {
                    cursor - 1
                } else if to <= cursor && cursor < from {
                    cursor + 1
                } else {
                    cursor
                }
            });
        }

        Ok(self.update(QueueChangeKind::Moved, vec![from, to]))
    }

    /// Make the entry at `index` current
    pub fn set_cursor(&mut self, index: usize) -> Result<QueueUpdate> {
        let len = self.entries.len();
        if index >= len {
            return Err(PlaybackError::IndexOutOfRange { index, len });
        }

        self.cursor = Some(index);
        Ok(self.update(QueueChangeKind::CursorMoved, vec![index]))
    }

    /// Move to the following entry, or to `None` past the end
    ///
    /// There is no wraparound. With no current entry this is a no-op.
    pub fn advance(&mut self) -> QueueUpdate {
        self.cursor = match self.cursor {
            Some(cursor) if cursor + 1 < self.entries.len() => Some(cursor + 1),
            _ => None,
        };
        self.cursor_update()
    }

    /// Move to the preceding entry, clamped at the first one
    ///
    /// With no current entry the last entry becomes current, so stepping
    /// back after the queue ran out replays the final track.
    pub fn rewind(&mut self) -> QueueUpdate {
        self.cursor = match self.cursor {
            Some(cursor) => Some(cursor.saturating_sub(1)),
            None => self.entries.len().checked_sub(1),
        };
        self.cursor_update()
    }

    /// Remove every entry
    pub fn clear(&mut self) -> QueueUpdate {
        let removed = (0..self.entries.len()).collect();
        self.entries.clear();
        self.cursor = None;
        self.update(QueueChangeKind::Cleared, removed)
    }

    // ===== Queries =====

    /// Entry at the cursor
    pub fn current(&self) -> Option<&QueueEntry> {
        self.cursor.and_then(|index| self.entries.get(index))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.entries.get(index)
    }

    /// Index of the entry with the given id
    pub fn position_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            entries: self.entries.clone(),
            cursor: self.cursor,
        }
    }

    // ===== Internals =====

    fn insert_block(&mut self, items: Vec<QueueItem>, position: EnqueuePosition) -> QueueUpdate {
        let count = items.len();
        let len = self.entries.len();

        let (at, make_current) = match (self.cursor, position) {
            _ if len == 0 => (0, true),
            (Some(cursor), EnqueuePosition::Next) => (cursor + 1, false),
            (Some(cursor), EnqueuePosition::Now) => (cursor, true),
            (None, EnqueuePosition::Now) => (len, true),
            (_, EnqueuePosition::End | EnqueuePosition::Next) => (len, false),
        };

        let entries: Vec<QueueEntry> = items
            .into_iter()
            .map(|item| QueueEntry {
                id: self.allocate_id(),
                item,
            })
            .collect();
        self.entries.splice(at..at, entries);

        if count > 0 {
            if make_current {
                self.cursor = Some(at);
            } else if let Some(cursor) = self.cursor {
                if at <= cursor {
                    self.cursor = Some(cursor + count);
                }
            }
        }

        self.update(QueueChangeKind::Inserted, (at..at + count).collect())
    }

    fn allocate_id(&mut self) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        id
    }

    fn cursor_update(&self) -> QueueUpdate {
        self.update(QueueChangeKind::CursorMoved, self.cursor.into_iter().collect())
    }

    fn update(&self, kind: QueueChangeKind, affected: Vec<usize>) -> QueueUpdate {
        debug_assert!(self.cursor.map_or(true, |cursor| cursor < self.entries.len()));
        QueueUpdate {
            snapshot: self.snapshot(),
            change: QueueChange::new(kind, affected),
        }
    }
}

impl Default for QueueStore {
    fn default() -> Self {
        Self::new()
    }
}
