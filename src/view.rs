//! View projection.
//!
//! The board is projected into a render-surface-agnostic tree after every
//! mutation; the embedding view rebuilds its display from it wholesale.
//! Full rebuild is deliberate at this board size — a retained-mode
//! surface would diff by entity id instead.

use serde::Serialize;

use crate::types::BoardState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView {
    pub columns: Vec<ColumnView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnView {
    pub id: String,
    pub title: String,
    pub cards: Vec<CardView>,
}

/// What a card face shows: the title, plus a marker when a description
/// exists. The description body itself only appears in the edit surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub id: String,
    pub title: String,
    pub has_description: bool,
}

impl BoardView {
    pub fn project(state: &BoardState) -> Self {
        BoardView {
            columns: state
                .columns
                .iter()
                .map(|column| ColumnView {
                    id: column.id.clone(),
                    title: column.title.clone(),
                    cards: column
                        .cards
                        .iter()
                        .map(|card| CardView {
                            id: card.id.clone(),
                            title: card.title.clone(),
                            has_description: !card.description.is_empty(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}
