//! Sparkboard — single-board kanban state engine.
//!
//! The crate owns the in-memory board model, its persistence as a single
//! JSON blob, the drag-reorder geometry, and the assistant gateway. The
//! rendering surface and UI chrome live in the embedding application; it
//! drives everything through [`engine::BoardEngine`] and projects state
//! with [`view::BoardView`] after each mutation.

pub mod assistant;
pub mod dnd;
pub mod engine;
pub mod storage;
pub mod types;
pub mod view;
