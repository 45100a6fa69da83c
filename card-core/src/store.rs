//! Shared editor storage for HTTP handlers.
//!
//! Provides a thread-safe [`EditorStore`] keyed by session id. State is held
//! in memory only and is discarded when the process exits.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::card::Card;
use crate::editor::{CardEditor, EditorSnapshot};
use crate::{CardError, CardResult, ImageRef, Verse};

/// Thread-safe editor storage.
///
/// Only mutating selections create a session. Reads of an unknown id see an
/// empty editor and leave the map untouched.
///
/// # Example
///
/// ```
/// use card_core::store::EditorStore;
/// use card_core::{Verse, VerseOrigin};
///
/// let store = EditorStore::new();
/// assert!(!store.snapshot("s1").can_export);
/// assert!(store.is_empty());
///
/// store.update("s1", |editor| editor.set_verse(Verse::new("T", "R"), VerseOrigin::Custom));
/// assert!(store.snapshot("s1").can_export);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EditorStore {
    editors: Arc<RwLock<HashMap<String, CardEditor>>>,
}

impl EditorStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty session. An existing session is kept as is.
    #[must_use]
    pub fn create(&self, session_id: &str) -> EditorSnapshot {
        self.update(session_id, |editor| editor.snapshot(session_id))
    }

    /// Get a copy of a session's editor if it exists.
    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<CardEditor> {
        let editors = self
            .editors
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        editors.get(session_id).cloned()
    }

    /// A session's editor, or an empty one for an unknown id. Never inserts.
    #[must_use]
    pub fn get_or_empty(&self, session_id: &str) -> CardEditor {
        self.get(session_id).unwrap_or_default()
    }

    /// Mutate a session's editor, creating it if needed.
    pub fn update<F, R>(&self, session_id: &str, f: F) -> R
    where
        F: FnOnce(&mut CardEditor) -> R,
    {
        let mut editors = self
            .editors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(editors.entry(session_id.to_string()).or_default())
    }

    /// Mutate a session's editor only if the session exists.
    pub fn update_existing<F, R>(&self, session_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut CardEditor) -> R,
    {
        let mut editors = self
            .editors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        editors.get_mut(session_id).map(f)
    }

    /// Snapshot of a session. Unknown ids read as an empty editor.
    #[must_use]
    pub fn snapshot(&self, session_id: &str) -> EditorSnapshot {
        self.get_or_empty(session_id).snapshot(session_id)
    }

    /// Drop a session. Returns whether it existed.
    pub fn remove(&self, session_id: &str) -> bool {
        let mut editors = self
            .editors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        editors.remove(session_id).is_some()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.editors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Claim the session's single export slot.
    ///
    /// The returned permit carries everything needed to render and clears
    /// the in-progress flag when dropped, whether the export succeeded or not.
    ///
    /// # Errors
    ///
    /// - [`CardError::NoVerseSelected`] if the session is unknown or has no
    ///   verse. The store is left unchanged.
    /// - [`CardError::ExportInProgress`] if another export holds the slot.
    pub fn begin_export(&self, session_id: &str) -> CardResult<ExportPermit> {
        self.update_existing(session_id, |editor| {
            let verse = editor.verse().cloned().ok_or(CardError::NoVerseSelected)?;
            if editor.is_exporting() {
                return Err(CardError::ExportInProgress);
            }
            editor.set_exporting(true);

            Ok(ExportPermit {
                store: self.clone(),
                session_id: session_id.to_string(),
                verse,
                image: editor.image().cloned(),
                card: editor.card(),
            })
        })
        .unwrap_or(Err(CardError::NoVerseSelected))
    }
}

/// Exclusive right to export one session's card.
#[derive(Debug)]
pub struct ExportPermit {
    store: EditorStore,
    session_id: String,
    verse: Verse,
    image: Option<ImageRef>,
    card: Card,
}

impl ExportPermit {
    /// Session being exported.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Verse at the time the export started.
    #[must_use]
    pub fn verse(&self) -> &Verse {
        &self.verse
    }

    /// Image at the time the export started.
    #[must_use]
    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    /// Card composed at the time the export started.
    #[must_use]
    pub fn card(&self) -> &Card {
        &self.card
    }
}

impl Drop for ExportPermit {
    fn drop(&mut self) {
        let mut editors = self
            .store
            .editors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(editor) = editors.get_mut(&self.session_id) {
            editor.set_exporting(false);
        }
    }
}
