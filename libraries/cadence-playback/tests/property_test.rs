//! Property-based tests for the queue store
//!
//! Uses proptest to drive random operation sequences and checks the cursor
//! invariants after every single operation, against a plain Vec model.

use cadence_playback::{
    EnqueuePosition, EntryId, PlaybackError, QueueItem, QueueStore, Shuffler,
};
use proptest::prelude::*;
use std::collections::HashMap;

// ===== Helpers =====

#[derive(Debug, Clone)]
enum Op {
    Enqueue(EnqueuePosition),
    EnqueueMany(usize, bool, EnqueuePosition),
    RemoveAt(usize),
    Move(usize, usize),
    SetCursor(usize),
    Advance,
    Rewind,
    Clear,
}

fn arbitrary_position() -> impl Strategy<Value = EnqueuePosition> {
    prop_oneof![
        Just(EnqueuePosition::End),
        Just(EnqueuePosition::Next),
        Just(EnqueuePosition::Now),
    ]
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => arbitrary_position().prop_map(Op::Enqueue),
        2 => (0usize..6, any::<bool>(), arbitrary_position())
            .prop_map(|(n, shuffle, pos)| Op::EnqueueMany(n, shuffle, pos)),
        3 => (0usize..12).prop_map(Op::RemoveAt),
        3 => (0usize..12, 0usize..12).prop_map(|(from, to)| Op::Move(from, to)),
        1 => (0usize..12).prop_map(Op::SetCursor),
        2 => Just(Op::Advance),
        1 => Just(Op::Rewind),
        1 => Just(Op::Clear),
    ]
}

fn arbitrary_items() -> impl Strategy<Value = Vec<QueueItem>> {
    prop::collection::vec(
        ("[a-z0-9]{1,8}", "[A-Za-z ]{1,20}", "[A-Za-z ]{1,20}")
            .prop_map(|(file, title, artist)| QueueItem::local(file, title, artist)),
        0..40,
    )
}

fn item(n: usize) -> QueueItem {
    // Deliberately repeat content so duplicates are exercised
    QueueItem::local(format!("{}.m4a", n % 3), format!("Track {}", n % 3), "Artist")
}

fn current_id(store: &QueueStore) -> Option<EntryId> {
    store.current().map(|entry| entry.id)
}

fn content_counts(items: &[QueueItem]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for item in items {
        *counts.entry(item.source.reference().to_string()).or_insert(0) += 1;
    }
    counts
}

fn sort_key(item: &QueueItem) -> (&str, &str, &str) {
    (item.source.reference(), &item.title, &item.artist)
}

// ===== Property Tests =====

proptest! {
    /// Property: the cursor is None or a valid index after every operation,
    /// and it keeps naming the same entry unless the operation is allowed
    /// to change it
    #[test]
    fn cursor_invariant_holds(ops in prop::collection::vec(arbitrary_op(), 1..80), seed in any::<u64>()) {
        let mut store = QueueStore::with_shuffler(Shuffler::seeded(seed));
        let mut counter = 0usize;

        for op in ops {
            let before = store.snapshot();
            let before_current = current_id(&store);
            let len = store.len();

            match op {
                Op::Enqueue(position) => {
                    counter += 1;
                    let update = store.enqueue(item(counter), position);
                    let inserted = update.snapshot.entries[update.change.affected[0]].id;

                    prop_assert_eq!(store.len(), len + 1);
                    if len == 0 || position == EnqueuePosition::Now {
                        prop_assert_eq!(current_id(&store), Some(inserted));
                    } else {
                        prop_assert_eq!(current_id(&store), before_current);
                    }
                }
                Op::EnqueueMany(n, shuffle, position) => {
                    let items: Vec<QueueItem> = (0..n).map(|i| item(counter + i)).collect();
                    counter += n;
                    let update = store.enqueue_many(items, shuffle, position);

                    prop_assert_eq!(store.len(), len + n);
                    prop_assert_eq!(update.change.affected.len(), n);
                    if n > 0 && (len == 0 || position == EnqueuePosition::Now) {
                        let first = update.snapshot.entries[update.change.affected[0]].id;
                        prop_assert_eq!(current_id(&store), Some(first));
                    } else {
                        prop_assert_eq!(current_id(&store), before_current);
                    }
                }
                Op::RemoveAt(index) => {
                    let result = store.remove_at(index);
                    if index >= len {
                        prop_assert_eq!(result, Err(PlaybackError::IndexOutOfRange { index, len }));
                        prop_assert_eq!(store.snapshot(), before);
                    } else {
                        let removed = before.entries[index].id;
                        let expected = if Some(removed) == before_current {
                            before.entries.get(index + 1).map(|entry| entry.id)
                        } else {
                            before_current
                        };
                        prop_assert_eq!(current_id(&store), expected);
                        prop_assert_eq!(store.position_of(removed), None);
                    }
                }
                Op::Move(from, to) => {
                    let result = store.move_item(from, to);
                    if from >= len || to >= len {
                        prop_assert!(result.is_err());
                        prop_assert_eq!(store.snapshot(), before);
                    } else {
                        let moved = before.entries[from].id;
                        prop_assert_eq!(store.position_of(moved), Some(to));
                        prop_assert_eq!(current_id(&store), before_current);
                    }
                }
                Op::SetCursor(index) => {
                    let result = store.set_cursor(index);
                    if index >= len {
                        prop_assert!(result.is_err());
                        prop_assert_eq!(store.snapshot(), before);
                    } else {
                        prop_assert_eq!(store.cursor(), Some(index));
                    }
                }
                Op::Advance => {
                    let expected = before.cursor.and_then(|c| (c + 1 < len).then_some(c + 1));
                    store.advance();
                    prop_assert_eq!(store.cursor(), expected);
                }
                Op::Rewind => {
                    store.rewind();
                    match before.cursor {
                        Some(c) => prop_assert_eq!(store.cursor(), Some(c.saturating_sub(1))),
                        None => prop_assert_eq!(store.cursor(), len.checked_sub(1)),
                    }
                }
                Op::Clear => {
                    store.clear();
                    prop_assert!(store.is_empty());
                }
            }

            // Structural invariant
            prop_assert!(store.cursor().map_or(true, |c| c < store.len()));
            if store.is_empty() {
                prop_assert_eq!(store.cursor(), None);
            }
        }
    }

    /// Property: shuffled bulk enqueue keeps the exact multiset of items
    #[test]
    fn shuffle_preserves_multiset(items in arbitrary_items(), seed in any::<u64>()) {
        let mut store = QueueStore::with_shuffler(Shuffler::seeded(seed));
        store.enqueue_many(items.clone(), true, EnqueuePosition::End);

        let queued: Vec<QueueItem> = store.entries().iter().map(|e| e.item.clone()).collect();
        prop_assert_eq!(queued.len(), items.len());
        prop_assert_eq!(content_counts(&queued), content_counts(&items));

        let mut expected = items.clone();
        let mut actual = queued;
        expected.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
        actual.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
        prop_assert_eq!(actual, expected);
    }

    /// Property: the same seed always yields the same queue order
    #[test]
    fn shuffle_is_deterministic_for_seed(items in arbitrary_items(), seed in any::<u64>()) {
        let mut first = QueueStore::with_shuffler(Shuffler::seeded(seed));
        let mut second = QueueStore::with_shuffler(Shuffler::seeded(seed));

        first.enqueue_many(items.clone(), true, EnqueuePosition::End);
        second.enqueue_many(items, true, EnqueuePosition::End);

        let a: Vec<&QueueItem> = first.entries().iter().map(|e| &e.item).collect();
        let b: Vec<&QueueItem> = second.entries().iter().map(|e| &e.item).collect();
        prop_assert_eq!(a, b);
    }

    /// Property: entry ids are unique across any sequence of inserts
    #[test]
    fn entry_ids_unique(batches in prop::collection::vec(0usize..10, 1..20)) {
        let mut store = QueueStore::with_shuffler(Shuffler::seeded(0));
        for (i, n) in batches.into_iter().enumerate() {
            let items = (0..n).map(item).collect();
            store.enqueue_many(items, i % 2 == 0, EnqueuePosition::Next);
        }

        let mut ids = store.snapshot().ids();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), total);
    }
}
