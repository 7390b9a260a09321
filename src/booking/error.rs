use thiserror::Error;

/// Message texts callers match on. Changing them is a breaking change.
pub mod messages {
    pub const BOOKING_FIELDS_REQUIRED: &str = "Bokning kräver giltiga start- och sluttider samt rum-id";
    pub const START_IN_PAST: &str = "Kan inte boka tid i dåtid";
    pub const END_NOT_AFTER_START: &str = "Sluttid måste vara efter starttid";
    pub const ROOM_NOT_FOUND: &str = "Rummet existerar inte";
    pub const WINDOW_REQUIRED: &str = "Måste ange både start- och sluttid";
    pub const BOOKING_ID_REQUIRED: &str = "Boknings-id kan inte vara null";
    pub const BOOKING_ALREADY_STARTED: &str = "Kan inte avboka påbörjad eller avslutad bokning";
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// Caller input failed a precondition.
    #[error("{0}")]
    InvalidArgument(&'static str),
    /// The operation is impossible in the current state.
    #[error("{0}")]
    IllegalState(&'static str),
}

impl BookingError {
    pub fn message(&self) -> &'static str {
        match self {
            BookingError::InvalidArgument(msg) | BookingError::IllegalState(msg) => msg,
        }
    }
}
