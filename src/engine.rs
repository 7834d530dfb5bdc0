//! Board mutation engine.
//!
//! `BoardEngine` is the single logical owner of a board: every mutation
//! goes through it, and every mutation is followed by a full-state save.
//! Operations on unresolved card/column ids are silent no-ops — a bad
//! reference never corrupts the remaining state and never aborts the
//! session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::dnd::InsertAnchor;
use crate::storage::{BlobStore, BOARD_KEY};
use crate::types::{timestamp_millis, BoardState, Card, Column};

/// Process-wide sequence counter folded into generated ids so that two
/// cards created within the same millisecond still get distinct ids.
static ID_SEQ: AtomicU64 = AtomicU64::new(0);

fn fresh_id(prefix: &str) -> String {
    let seq = ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{:x}-{:04x}", prefix, timestamp_millis(), seq & 0xFFFF)
}

pub struct BoardEngine {
    state: BoardState,
    store: Arc<dyn BlobStore>,
}

impl BoardEngine {
    /// Start with the built-in sample board without touching storage.
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            state: BoardState::starter(),
            store,
        }
    }

    /// Start from persisted state if present and well-formed, otherwise
    /// from the built-in sample board.
    pub fn load(store: Arc<dyn BlobStore>) -> Self {
        let mut engine = Self::new(store);
        engine.reload();
        engine
    }

    /// Re-read the blob from storage. A missing or malformed blob leaves
    /// the current in-memory state intact (logged, never an error to the
    /// caller) — corruption must not reset the board under the user.
    pub fn reload(&mut self) {
        let blob = match self.store.get(BOARD_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => return,
            Err(e) => {
                log::warn!("[sparkboard.engine] Failed to read stored board: {}", e);
                return;
            }
        };
        match serde_json::from_str::<BoardState>(&blob) {
            Ok(state) => self.state = state,
            Err(e) => {
                log::warn!(
                    "[sparkboard.engine] Stored board is not a valid board blob, keeping current state: {}",
                    e
                );
            }
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    /// Serialize and store the full board. Fire-and-forget: failures go to
    /// the log channel, the caller continues with its in-memory state.
    fn persist(&self) {
        let blob = match serde_json::to_string(&self.state) {
            Ok(blob) => blob,
            Err(e) => {
                log::error!("[sparkboard.engine] Failed to serialize board: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(BOARD_KEY, &blob) {
            log::error!("[sparkboard.engine] Failed to save board: {}", e);
        }
    }

    /// Append a new card to the end of a column. Returns the fresh card id,
    /// or None if `column_id` does not resolve.
    pub fn add_card(
        &mut self,
        column_id: &str,
        title: &str,
        description: &str,
    ) -> Option<String> {
        let column = self.state.column_mut(column_id)?;
        let card = Card {
            id: fresh_id("card"),
            title: title.to_string(),
            description: description.to_string(),
            created_at: timestamp_millis(),
        };
        let id = card.id.clone();
        column.cards.push(card);
        self.persist();
        Some(id)
    }

    /// Move a card to the end of the destination column. The card is
    /// located by scanning all columns; removal happens before insertion,
    /// so the card is never owned by two columns at once. Moving within
    /// the same column moves the card to its end. Unknown card or
    /// destination ids are no-ops.
    pub fn move_card(&mut self, card_id: &str, dest_column_id: &str) {
        self.commit_drop(card_id, dest_column_id, InsertAnchor::End);
    }

    /// Commit a drop at the position the drag geometry computed. The
    /// anchor index is relative to the destination's sibling list
    /// excluding the dragged card, which is exactly what remains after
    /// removal — so same-column drops land where the user saw them.
    pub fn commit_drop(&mut self, card_id: &str, dest_column_id: &str, anchor: InsertAnchor) {
        // A missing destination must not drop the card, so resolve it
        // before removing anything.
        if self.state.column(dest_column_id).is_none() {
            return;
        }
        let Some(card) = self.take_card(card_id) else {
            return;
        };
        // take_card checked above, still present
        if let Some(dest) = self.state.column_mut(dest_column_id) {
            match anchor {
                InsertAnchor::Before(index) => {
                    let index = index.min(dest.cards.len());
                    dest.cards.insert(index, card);
                }
                InsertAnchor::End => dest.cards.push(card),
            }
        }
        self.persist();
    }

    /// Remove a card from whichever column owns it.
    fn take_card(&mut self, card_id: &str) -> Option<Card> {
        for column in &mut self.state.columns {
            if let Some(index) = column.cards.iter().position(|c| c.id == card_id) {
                return Some(column.cards.remove(index));
            }
        }
        None
    }

    /// In-place update of a card's title and description.
    pub fn edit_card(&mut self, column_id: &str, card_id: &str, title: &str, description: &str) {
        let Some(column) = self.state.column_mut(column_id) else {
            return;
        };
        let Some(card) = column.cards.iter_mut().find(|c| c.id == card_id) else {
            return;
        };
        card.title = title.to_string();
        card.description = description.to_string();
        self.persist();
    }

    pub fn delete_card(&mut self, column_id: &str, card_id: &str) {
        let Some(column) = self.state.column_mut(column_id) else {
            return;
        };
        let Some(index) = column.cards.iter().position(|c| c.id == card_id) else {
            return;
        };
        column.cards.remove(index);
        self.persist();
    }

    /// Append a new empty column. Returns the fresh column id.
    pub fn add_column(&mut self, title: &str) -> String {
        let column = Column {
            id: fresh_id("col"),
            title: title.to_string(),
            cards: Vec::new(),
        };
        let id = column.id.clone();
        self.state.columns.push(column);
        self.persist();
        id
    }

    /// Remove a column and all of its cards. Confirming destructive
    /// intent is the caller's concern.
    pub fn delete_column(&mut self, column_id: &str) {
        let Some(index) = self.state.columns.iter().position(|c| c.id == column_id) else {
            return;
        };
        self.state.columns.remove(index);
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn engine() -> BoardEngine {
        BoardEngine::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn add_card_appends_to_column_end() {
        let mut engine = engine();
        let id = engine.add_card("col-1", "New task", "").unwrap();
        let column = engine.state().column("col-1").unwrap();
        assert_eq!(column.cards.last().unwrap().id, id);
        assert_eq!(column.cards.last().unwrap().title, "New task");
        assert_eq!(column.cards.last().unwrap().description, "");
    }

    #[test]
    fn add_card_unknown_column_is_noop() {
        let mut engine = engine();
        let before = engine.state().clone();
        assert!(engine.add_card("no-such-col", "x", "").is_none());
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn rapid_adds_get_distinct_ids() {
        let mut engine = engine();
        let a = engine.add_card("col-1", "a", "").unwrap();
        let b = engine.add_card("col-1", "b", "").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn move_card_appends_to_destination() {
        let mut engine = engine();
        let total = engine.state().card_count();
        engine.move_card("card-1", "col-2");

        assert_eq!(engine.state().card_count(), total);
        let source = engine.state().column("col-1").unwrap();
        let dest = engine.state().column("col-2").unwrap();
        assert!(source.cards.iter().all(|c| c.id != "card-1"));
        assert_eq!(dest.cards.last().unwrap().id, "card-1");
    }

    #[test]
    fn move_card_same_column_moves_to_end() {
        let mut engine = engine();
        engine.move_card("card-1", "col-1");
        let column = engine.state().column("col-1").unwrap();
        assert_eq!(column.cards.len(), 2);
        assert_eq!(column.cards.last().unwrap().id, "card-1");
    }

    #[test]
    fn move_card_unknown_refs_are_noops() {
        let mut engine = engine();
        let before = engine.state().clone();

        engine.move_card("no-such-card", "col-2");
        assert_eq!(engine.state(), &before);

        // Unknown destination must not drop the card either.
        engine.move_card("card-1", "no-such-col");
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn commit_drop_inserts_at_anchor() {
        let mut engine = engine();
        let extra = engine.add_card("col-2", "already there", "").unwrap();
        engine.commit_drop("card-1", "col-2", InsertAnchor::Before(0));

        let dest = engine.state().column("col-2").unwrap();
        assert_eq!(dest.cards[0].id, "card-1");
        assert_eq!(dest.cards[1].id, extra);
    }

    #[test]
    fn commit_drop_same_column_reorders() {
        let mut engine = engine();
        // card-2 is currently after card-1; drop it before card-1.
        engine.commit_drop("card-2", "col-1", InsertAnchor::Before(0));
        let column = engine.state().column("col-1").unwrap();
        assert_eq!(column.cards[0].id, "card-2");
        assert_eq!(column.cards[1].id, "card-1");
    }

    #[test]
    fn commit_drop_clamps_out_of_range_anchor() {
        let mut engine = engine();
        engine.commit_drop("card-1", "col-2", InsertAnchor::Before(99));
        let dest = engine.state().column("col-2").unwrap();
        assert_eq!(dest.cards.last().unwrap().id, "card-1");
    }

    #[test]
    fn edit_card_updates_in_place() {
        let mut engine = engine();
        engine.edit_card("col-1", "card-1", "New title", "New body");
        let card = &engine.state().column("col-1").unwrap().cards[0];
        assert_eq!(card.title, "New title");
        assert_eq!(card.description, "New body");
    }

    #[test]
    fn edit_card_unknown_refs_are_noops() {
        let mut engine = engine();
        let before = engine.state().clone();
        engine.edit_card("col-1", "no-such-card", "x", "y");
        engine.edit_card("no-such-col", "card-1", "x", "y");
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn delete_card_removes_only_target() {
        let mut engine = engine();
        engine.delete_card("col-1", "card-1");
        let column = engine.state().column("col-1").unwrap();
        assert_eq!(column.cards.len(), 1);
        assert_eq!(column.cards[0].id, "card-2");
    }

    #[test]
    fn delete_card_unknown_refs_are_noops() {
        let mut engine = engine();
        let before = engine.state().clone();
        engine.delete_card("col-1", "no-such-card");
        engine.delete_card("no-such-col", "card-1");
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn add_and_delete_column() {
        let mut engine = engine();
        let id = engine.add_column("Blocked");
        assert_eq!(engine.state().columns.len(), 4);
        assert_eq!(engine.state().column(&id).unwrap().title, "Blocked");

        engine.delete_column(&id);
        assert_eq!(engine.state().columns.len(), 3);
        assert!(engine.state().column(&id).is_none());
    }

    #[test]
    fn delete_column_unknown_id_is_noop() {
        let mut engine = engine();
        let before = engine.state().clone();
        engine.delete_column("no-such-col");
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn mutations_are_persisted_and_reloadable() {
        let store = Arc::new(MemoryStore::new());
        let mut engine = BoardEngine::new(store.clone());
        engine.add_card("col-1", "Persisted task", "body");
        engine.move_card("card-2", "col-3");
        let saved = engine.state().clone();

        let reloaded = BoardEngine::load(store);
        assert_eq!(reloaded.state(), &saved);
    }

    #[test]
    fn load_missing_blob_yields_starter_board() {
        let engine = BoardEngine::load(Arc::new(MemoryStore::new()));
        assert_eq!(engine.state(), &BoardState::starter());
    }

    #[test]
    fn load_corrupt_blob_keeps_held_state() {
        let store = Arc::new(MemoryStore::new());
        store.set(BOARD_KEY, "not json at all {{{").unwrap();
        let engine = BoardEngine::load(store.clone());
        assert_eq!(engine.state(), &BoardState::starter());

        // Structurally wrong JSON is a parse failure too, and reload
        // must not clobber in-memory mutations.
        let mut engine = engine;
        engine.add_column("Kept");
        let before = engine.state().clone();
        store.set(BOARD_KEY, r#"{"columns": "nope"}"#).unwrap();
        engine.reload();
        assert_eq!(engine.state(), &before);
    }
}
