//! In-process document store.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::notes::types::{NewNote, Note, NoteId, User, UserId};
use crate::observability::metrics;
use crate::store::{DocumentStore, StoreResult};

#[derive(Debug, Clone)]
struct StoredNote {
    seq: u64,
    note: Note,
}

/// A thread-safe store keeping both collections in memory.
///
/// Clones share the same underlying maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
    notes: Arc<DashMap<NoteId, StoredNote>>,
    users: Arc<DashMap<UserId, User>>,
    next_seq: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted notes.
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// Number of registered users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_note(&self, note: NewNote) -> StoreResult<NoteId> {
        let id = NoteId::new();
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.notes.insert(
            id,
            StoredNote {
                seq,
                note: Note {
                    id,
                    creation_time: now_millis(),
                    body: note.body,
                    user_id: note.user_id,
                },
            },
        );
        metrics::record_store_size(self.notes.len());
        Ok(id)
    }

    async fn get_note(&self, id: &NoteId) -> StoreResult<Option<Note>> {
        Ok(self.notes.get(id).map(|r| r.value().note.clone()))
    }

    async fn delete_note(&self, id: &NoteId) -> StoreResult<bool> {
        let removed = self.notes.remove(id).is_some();
        metrics::record_store_size(self.notes.len());
        Ok(removed)
    }

    async fn scan_notes(&self) -> StoreResult<Vec<Note>> {
        let mut stored: Vec<StoredNote> = self.notes.iter().map(|r| r.value().clone()).collect();
        stored.sort_by_key(|s| s.seq);
        Ok(stored.into_iter().map(|s| s.note).collect())
    }

    async fn get_user(&self, id: &UserId) -> StoreResult<Option<User>> {
        Ok(self.users.get(id).map(|r| r.value().clone()))
    }

    async fn put_user(&self, user: User) -> StoreResult<()> {
        self.users.insert(user.id.clone(), user);
        Ok(())
    }
}
