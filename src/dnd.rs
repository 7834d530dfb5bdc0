//! Drag-reorder geometry.
//!
//! During a drag the embedding view reports the pointer's vertical
//! position and the bounding boxes of the non-dragged cards in the
//! hovered column, in container order. [`insert_anchor`] turns that into
//! the position the dragged card should land at. The computation is
//! purely geometric — it never looks at card identity or content — so it
//! can be unit-tested without a display surface.

/// Bounding box of a rendered sibling card, in the same coordinate space
/// as the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardBounds {
    pub top: f64,
    pub height: f64,
}

impl CardBounds {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Where the dragged card should be inserted: before the sibling at the
/// given index (an index into the non-dragged sibling list), or at the
/// end of the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAnchor {
    Before(usize),
    End,
}

/// Compute the insert position for a dragged card.
///
/// For each sibling the signed offset is `pointer_y - midpoint`. Among
/// siblings whose offset is negative (pointer above the midpoint) the one
/// closest to zero wins — the nearest sibling below the pointer. If the
/// pointer is below every midpoint, or there are no siblings, the card
/// goes to the end.
pub fn insert_anchor(pointer_y: f64, siblings: &[CardBounds]) -> InsertAnchor {
    let mut closest: Option<(usize, f64)> = None;
    for (index, sibling) in siblings.iter().enumerate() {
        let offset = pointer_y - sibling.midpoint();
        if offset < 0.0 && closest.map_or(true, |(_, best)| offset > best) {
            closest = Some((index, offset));
        }
    }
    match closest {
        Some((index, _)) => InsertAnchor::Before(index),
        None => InsertAnchor::End,
    }
}
