use serde::Serialize;

pub const WHO_CAN_VIEW_PUBLIC: i64 = 1;
pub const NOTE_TYPE_STANDARD: i64 = 1;

/// Request body for `POST /ticketnotes`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NoteCreate {
    pub ticket_id: i64,
    pub note_html: String,
    pub outcome: String,
    pub who_can_view_id: i64,
    pub note_type_id: i64,
}

impl NoteCreate {
    /// Public, standard note with an empty outcome.
    pub fn new(ticket_id: i64, note_html: impl Into<String>) -> Self {
        Self {
            ticket_id,
            note_html: note_html.into(),
            outcome: String::new(),
            who_can_view_id: WHO_CAN_VIEW_PUBLIC,
            note_type_id: NOTE_TYPE_STANDARD,
        }
    }
}
