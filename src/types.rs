use serde::{Deserialize, Serialize};

/// A single work item on the board.
///
/// `created_at` is milliseconds since the Unix epoch and serializes as
/// `createdAt` to match the stored blob format. `description` defaults to
/// the empty string on deserialization — older blobs may omit the field,
/// but in memory it is never absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: u64,
}

/// An ordered list of cards representing a workflow stage.
/// Card order is display and persistence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub cards: Vec<Card>,
}

/// The whole board: an ordered sequence of columns. This is the root
/// aggregate and the sole unit of persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    pub columns: Vec<Column>,
}

impl BoardState {
    /// First-run sample board: three stages, two seed cards.
    /// Sample content only — nothing depends on these titles or ids.
    pub fn starter() -> Self {
        let now = timestamp_millis();
        BoardState {
            columns: vec![
                Column {
                    id: "col-1".to_string(),
                    title: "To Do".to_string(),
                    cards: vec![
                        Card {
                            id: "card-1".to_string(),
                            title: "Welcome to Sparkboard!".to_string(),
                            description: "Drag this card to another list to see it in action."
                                .to_string(),
                            created_at: now,
                        },
                        Card {
                            id: "card-2".to_string(),
                            title: "Try AI Task Generation".to_string(),
                            description: "Click the wand icon in the column header.".to_string(),
                            created_at: now,
                        },
                    ],
                },
                Column {
                    id: "col-2".to_string(),
                    title: "Doing".to_string(),
                    cards: Vec::new(),
                },
                Column {
                    id: "col-3".to_string(),
                    title: "Done".to_string(),
                    cards: Vec::new(),
                },
            ],
        }
    }

    /// Total number of cards across all columns.
    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn column_mut(&mut self, column_id: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id == column_id)
    }
}

/// Generate a millisecond timestamp from the current system time.
pub fn timestamp_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
