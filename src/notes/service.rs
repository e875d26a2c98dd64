//! Note use-cases.
//!
//! # Responsibility
//! - Create notes for an authenticated identity under the `createNote` quota.
//! - Delete notes on behalf of their owner only.
//! - List every note joined with its owner's display profile.
//!
//! # Invariants
//! - The owner of a note is fixed at creation.
//! - `get_notes` returns notes in store scan order, whatever order the owner
//!   lookups complete in.

use futures_util::future::try_join_all;
use std::sync::Arc;

use crate::config::CREATE_NOTE_POLICY;
use crate::notes::error::{NotesError, NotesResult};
use crate::notes::types::{NewNote, Note, NoteId, NoteView, UserId};
use crate::observability::metrics;
use crate::security::RateLimiter;
use crate::store::DocumentStore;

/// The notes module, composed from its collaborators.
#[derive(Clone)]
pub struct NotesService {
    store: Arc<dyn DocumentStore>,
    limiter: Arc<dyn RateLimiter>,
}

impl NotesService {
    pub fn new(store: Arc<dyn DocumentStore>, limiter: Arc<dyn RateLimiter>) -> Self {
        Self { store, limiter }
    }

    /// Persist a new note owned by `identity`.
    pub async fn upload_note(&self, identity: Option<&UserId>, body: String) -> NotesResult<()> {
        let user_id = identity.ok_or(NotesError::Unauthorized)?;

        self.limiter.limit(CREATE_NOTE_POLICY, user_id.as_str())?;

        let inserted = self
            .store
            .insert_note(NewNote {
                body,
                user_id: user_id.clone(),
            })
            .await;
        let id = match inserted {
            Ok(id) => id,
            Err(err) => {
                self.limiter.refund(CREATE_NOTE_POLICY, user_id.as_str());
                return Err(err.into());
            }
        };

        tracing::info!(note_id = %id, user_id = %user_id, "Note created");
        metrics::record_note_event("created");
        Ok(())
    }

    /// Remove a note. Only its owner may do so.
    pub async fn delete_note(&self, identity: Option<&UserId>, note_id: NoteId) -> NotesResult<()> {
        let note = self.assert_note_owner(identity, note_id).await?;
        if !self.store.delete_note(&note.id).await? {
            return Err(NotesError::NotFound(note_id));
        }

        tracing::info!(note_id = %note.id, user_id = %note.user_id, "Note deleted");
        metrics::record_note_event("deleted");
        Ok(())
    }

    /// Every note, annotated with its owner's name and image.
    pub async fn get_notes(&self) -> NotesResult<Vec<NoteView>> {
        let notes = self.store.scan_notes().await?;

        let views = try_join_all(notes.into_iter().map(|note| async move {
            let owner = self.store.get_user(&note.user_id).await?;
            Ok::<_, NotesError>(NoteView::new(note, owner))
        }))
        .await?;

        tracing::debug!(count = views.len(), "Notes listed");
        metrics::record_notes_listed(views.len());
        Ok(views)
    }

    async fn assert_note_owner(&self, identity: Option<&UserId>, note_id: NoteId) -> NotesResult<Note> {
        let user_id = identity.ok_or(NotesError::Unauthorized)?;

        let note = self
            .store
            .get_note(&note_id)
            .await?
            .ok_or(NotesError::NotFound(note_id))?;

        if &note.user_id != user_id {
            tracing::warn!(note_id = %note_id, user_id = %user_id, "Delete attempted by non-owner");
            return Err(NotesError::Unauthorized);
        }
        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;
    use crate::notes::types::User;
    use crate::security::PolicyRateLimiter;
    use crate::store::{MemoryStore, StoreError, StoreResult};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Barrier;

    fn service() -> (NotesService, MemoryStore) {
        let store = MemoryStore::new();
        let limiter = PolicyRateLimiter::new(&RateLimitConfig::default().policies);
        (NotesService::new(Arc::new(store.clone()), Arc::new(limiter)), store)
    }

    fn u(id: &str) -> UserId {
        UserId::from(id)
    }

    #[tokio::test]
    async fn test_upload_requires_identity() {
        let (service, store) = service();
        let err = service.upload_note(None, "hello".into()).await.unwrap_err();
        assert!(matches!(err, NotesError::Unauthorized));
        assert_eq!(store.note_count(), 0);
    }

    #[tokio::test]
    async fn test_second_upload_in_window_is_rate_limited() {
        let (service, store) = service();
        service.upload_note(Some(&u("u1")), "hello".into()).await.unwrap();

        let err = service.upload_note(Some(&u("u1")), "again".into()).await.unwrap_err();
        match err {
            NotesError::RateLimited { policy, retry_after } => {
                assert_eq!(policy, CREATE_NOTE_POLICY);
                assert!(retry_after > Duration::from_secs(58));
                assert!(retry_after <= Duration::from_secs(60));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
        assert_eq!(store.note_count(), 1);

        // Quota is per identity.
        service.upload_note(Some(&u("u2")), "hi".into()).await.unwrap();
        assert_eq!(store.note_count(), 2);
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let (service, store) = service();
        service.upload_note(Some(&u("u1")), "mine".into()).await.unwrap();
        let id = store.scan_notes().await.unwrap()[0].id;

        assert!(matches!(
            service.delete_note(None, id).await,
            Err(NotesError::Unauthorized)
        ));
        assert!(matches!(
            service.delete_note(Some(&u("u2")), id).await,
            Err(NotesError::Unauthorized)
        ));
        assert_eq!(store.note_count(), 1);

        service.delete_note(Some(&u("u1")), id).await.unwrap();
        assert_eq!(store.note_count(), 0);

        assert!(matches!(
            service.delete_note(Some(&u("u1")), id).await,
            Err(NotesError::NotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_unauthenticated_delete_of_missing_note_is_unauthorized() {
        let (service, _) = service();
        assert!(matches!(
            service.delete_note(None, NoteId::new()).await,
            Err(NotesError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_get_notes_joins_owner_profiles() {
        let (service, store) = service();
        store
            .put_user(User {
                id: u("u1"),
                name: Some("Ada".into()),
                image: Some("ada.png".into()),
            })
            .await
            .unwrap();
        store
            .put_user(User { id: u("u2"), name: Some("Bo".into()), image: None })
            .await
            .unwrap();

        service.upload_note(Some(&u("u1")), "first".into()).await.unwrap();
        service.upload_note(Some(&u("u2")), "second".into()).await.unwrap();
        service.upload_note(Some(&u("ghost")), "third".into()).await.unwrap();

        let views = service.get_notes().await.unwrap();
        let bodies: Vec<&str> = views.iter().map(|v| v.body.as_str()).collect();
        assert_eq!(bodies, ["first", "second", "third"]);

        assert_eq!(views[0].user_name.as_deref(), Some("Ada"));
        assert_eq!(views[0].user_image.as_deref(), Some("ada.png"));
        assert_eq!(views[1].user_name.as_deref(), Some("Bo"));
        assert_eq!(views[1].user_image, None);
        assert_eq!(views[2].user_id, u("ghost"));
        assert_eq!(views[2].user_name, None);
    }

    /// Store whose user lookups finish in reverse order of issue.
    #[derive(Clone, Default)]
    struct SlowUsers {
        inner: MemoryStore,
    }

    #[async_trait]
    impl DocumentStore for SlowUsers {
        async fn insert_note(&self, note: NewNote) -> StoreResult<NoteId> {
            self.inner.insert_note(note).await
        }
        async fn get_note(&self, id: &NoteId) -> StoreResult<Option<Note>> {
            self.inner.get_note(id).await
        }
        async fn delete_note(&self, id: &NoteId) -> StoreResult<bool> {
            self.inner.delete_note(id).await
        }
        async fn scan_notes(&self) -> StoreResult<Vec<Note>> {
            self.inner.scan_notes().await
        }
        async fn get_user(&self, id: &UserId) -> StoreResult<Option<User>> {
            let n: u64 = id.as_str().trim_start_matches('u').parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(50u64.saturating_sub(n * 10))).await;
            self.inner.get_user(id).await
        }
        async fn put_user(&self, user: User) -> StoreResult<()> {
            self.inner.put_user(user).await
        }
    }

    #[tokio::test]
    async fn test_get_notes_keeps_scan_order() {
        let store = SlowUsers::default();
        let limiter = PolicyRateLimiter::new(&RateLimitConfig::default().policies);
        let service = NotesService::new(Arc::new(store.clone()), Arc::new(limiter));

        for i in 0..5 {
            let id = u(&format!("u{i}"));
            store
                .put_user(User { id: id.clone(), name: Some(format!("user {i}")), image: None })
                .await
                .unwrap();
            service.upload_note(Some(&id), format!("note {i}")).await.unwrap();
        }

        let views = service.get_notes().await.unwrap();
        for (i, view) in views.iter().enumerate() {
            assert_eq!(view.body, format!("note {i}"));
            assert_eq!(view.user_name, Some(format!("user {i}")));
        }
    }

    /// Store that is always down.
    struct Offline;

    #[async_trait]
    impl DocumentStore for Offline {
        async fn insert_note(&self, _: NewNote) -> StoreResult<NoteId> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn get_note(&self, _: &NoteId) -> StoreResult<Option<Note>> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn delete_note(&self, _: &NoteId) -> StoreResult<bool> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn scan_notes(&self) -> StoreResult<Vec<Note>> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn get_user(&self, _: &UserId) -> StoreResult<Option<User>> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn put_user(&self, _: User) -> StoreResult<()> {
            Err(StoreError::Unavailable("offline".into()))
        }
    }

    #[tokio::test]
    async fn test_listing_reflects_current_profile() {
        let (service, store) = service();
        store
            .put_user(User { id: u("u1"), name: Some("Ada".into()), image: None })
            .await
            .unwrap();
        service.upload_note(Some(&u("u1")), "hello".into()).await.unwrap();

        store
            .put_user(User {
                id: u("u1"),
                name: Some("Ada Lovelace".into()),
                image: Some("new.png".into()),
            })
            .await
            .unwrap();

        let views = service.get_notes().await.unwrap();
        assert_eq!(views[0].user_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(views[0].user_image.as_deref(), Some("new.png"));
    }

    /// Store where two deletes of the same note both pass the lookup before
    /// either removes it.
    struct Interleaved {
        inner: MemoryStore,
        lookups: Barrier,
    }

    #[async_trait]
    impl DocumentStore for Interleaved {
        async fn insert_note(&self, note: NewNote) -> StoreResult<NoteId> {
            self.inner.insert_note(note).await
        }
        async fn get_note(&self, id: &NoteId) -> StoreResult<Option<Note>> {
            let note = self.inner.get_note(id).await;
            self.lookups.wait().await;
            note
        }
        async fn delete_note(&self, id: &NoteId) -> StoreResult<bool> {
            self.inner.delete_note(id).await
        }
        async fn scan_notes(&self) -> StoreResult<Vec<Note>> {
            self.inner.scan_notes().await
        }
        async fn get_user(&self, id: &UserId) -> StoreResult<Option<User>> {
            self.inner.get_user(id).await
        }
        async fn put_user(&self, user: User) -> StoreResult<()> {
            self.inner.put_user(user).await
        }
    }

    #[tokio::test]
    async fn test_racing_deletes_succeed_once() {
        let inner = MemoryStore::new();
        let id = inner
            .insert_note(NewNote { body: "mine".into(), user_id: u("u1") })
            .await
            .unwrap();
        let store = Interleaved { inner: inner.clone(), lookups: Barrier::new(2) };
        let limiter = PolicyRateLimiter::new(&RateLimitConfig::default().policies);
        let service = NotesService::new(Arc::new(store), Arc::new(limiter));

        let owner = u("u1");
        let (first, second) = tokio::join!(
            service.delete_note(Some(&owner), id),
            service.delete_note(Some(&owner), id)
        );

        let ok = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 1, "first={first:?} second={second:?}");
        assert!(matches!(
            first.err().or(second.err()),
            Some(NotesError::NotFound(missing)) if missing == id
        ));
        assert_eq!(inner.note_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_insert_refunds_quota() {
        let limiter = Arc::new(PolicyRateLimiter::new(&RateLimitConfig::default().policies));
        let service = NotesService::new(Arc::new(Offline), limiter.clone());

        assert!(matches!(
            service.upload_note(Some(&u("u1")), "x".into()).await,
            Err(NotesError::Store(_))
        ));
        assert!(limiter.check(CREATE_NOTE_POLICY, "u1").is_ok());
        assert!(limiter.limit(CREATE_NOTE_POLICY, "u1").is_ok());
        assert!(limiter.limit(CREATE_NOTE_POLICY, "u1").is_err());
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let limiter = PolicyRateLimiter::new(&RateLimitConfig::default().policies);
        let service = NotesService::new(Arc::new(Offline), Arc::new(limiter));

        assert!(matches!(
            service.upload_note(Some(&u("u1")), "x".into()).await,
            Err(NotesError::Store(_))
        ));
        assert!(matches!(
            service.delete_note(Some(&u("u1")), NoteId::new()).await,
            Err(NotesError::Store(_))
        ));
        assert!(matches!(service.get_notes().await, Err(NotesError::Store(_))));
    }

    #[tokio::test]
    async fn test_missing_policy_is_not_reported_as_rate_limited() {
        let limiter = PolicyRateLimiter::new(&Default::default());
        let service = NotesService::new(Arc::new(MemoryStore::new()), Arc::new(limiter));
        assert!(matches!(
            service.upload_note(Some(&u("u1")), "x".into()).await,
            Err(NotesError::RateLimiter(_))
        ));
    }
}
