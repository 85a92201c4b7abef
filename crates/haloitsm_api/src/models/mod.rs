mod field_ref;
mod note;
mod ticket;

pub use field_ref::FieldRef;
pub use note::{NoteCreate, NOTE_TYPE_STANDARD, WHO_CAN_VIEW_PUBLIC};
pub use ticket::{
    TicketCreate, TicketSearch, TicketUpdate, ACTION_CODE_NEW, ACTION_CODE_UPDATE,
    DEFAULT_SEARCH_COUNT, DEFAULT_SEARCH_PAGE,
};
