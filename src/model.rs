use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A reservation of one room for one window. Never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    id: String,
    room_id: String,
    span: Span,
}

impl Booking {
    pub fn new(id: impl Into<String>, room_id: impl Into<String>, span: Span) -> Self {
        Self {
            id: id.into(),
            room_id: room_id.into(),
            span,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn start(&self) -> Ms {
        self.span.start
    }

    pub fn end(&self) -> Ms {
        self.span.end
    }
}

/// Why a booking cannot be owned by a room.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("booking {0}: end must be after start")]
    EmptySpan(String),
    #[error("booking {booking_id} belongs to room {room_id}")]
    ForeignBooking { booking_id: String, room_id: String },
    #[error("duplicate booking id: {0}")]
    DuplicateBooking(String),
    #[error("booking {booking_id} overlaps {existing}")]
    Overlap { booking_id: String, existing: String },
}

/// A bookable room and the bookings it owns.
///
/// The room is the only place bookings live: availability, lookup and
/// cancellation all go through it, and no two owned bookings overlap.
/// Deserialization re-adds every booking, so a loaded room holds the same
/// invariants as one built in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RoomRepr")]
pub struct Room {
    id: String,
    name: Option<String>,
    /// Sorted by `span.start`.
    bookings: Vec<Booking>,
}

impl Room {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            bookings: Vec::new(),
        }
    }

    pub fn with_name(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(id)
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Owned bookings in start order.
    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    /// True iff no owned booking overlaps `[start, end)`.
    pub fn is_available(&self, start: Ms, end: Ms) -> bool {
        self.overlapping(&Span { start, end }).next().is_none()
    }

    pub fn has_booking(&self, booking_id: &str) -> bool {
        self.get_booking(booking_id).is_some()
    }

    pub fn get_booking(&self, booking_id: &str) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == booking_id)
    }

    /// Take ownership of `booking` if its window is free.
    ///
    /// Returns false and leaves the room untouched when `try_add_booking`
    /// would refuse it.
    pub fn add_booking(&mut self, booking: Booking) -> bool {
        self.try_add_booking(booking).is_ok()
    }

    pub fn try_add_booking(&mut self, booking: Booking) -> Result<(), RoomError> {
        if booking.span.start >= booking.span.end {
            return Err(RoomError::EmptySpan(booking.id));
        }
        if booking.room_id != self.id {
            return Err(RoomError::ForeignBooking {
                booking_id: booking.id,
                room_id: booking.room_id,
            });
        }
        if self.has_booking(&booking.id) {
            return Err(RoomError::DuplicateBooking(booking.id));
        }
        if let Some(existing) = self.overlapping(&booking.span).next() {
            return Err(RoomError::Overlap {
                existing: existing.id.clone(),
                booking_id: booking.id,
            });
        }
        let pos = self
            .bookings
            .binary_search_by_key(&booking.span.start, |b| b.span.start)
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
        Ok(())
    }

    /// Remove a booking by id.
    pub fn cancel_booking(&mut self, booking_id: &str) -> Option<Booking> {
        let pos = self.bookings.iter().position(|b| b.id == booking_id)?;
        Some(self.bookings.remove(pos))
    }

    /// Bookings whose span overlaps the query window.
    /// Uses binary search to skip bookings starting at or after `query.end`.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &Booking> {
        // Everything at index >= right_bound starts at or after query.end → can't overlap.
        let right_bound = self.bookings.partition_point(|b| b.span.start < query.end);
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.span.end > query.start)
    }
}

/// Wire shape of a room; bookings may arrive in any order.
#[derive(Deserialize)]
struct RoomRepr {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    bookings: Vec<Booking>,
}

impl TryFrom<RoomRepr> for Room {
    type Error = RoomError;

    fn try_from(repr: RoomRepr) -> Result<Self, Self::Error> {
        let mut room = Room {
            id: repr.id,
            name: repr.name,
            bookings: Vec::with_capacity(repr.bookings.len()),
        };
        for booking in repr.bookings {
            room.try_add_booking(booking)?;
        }
        Ok(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(id: &str, start: Ms, end: Ms) -> Booking {
        Booking::new(id, "1D", Span::new(start, end))
    }

    #[test]
    fn span_overlap() {
        let a = Span::new(100, 200);
        let b = Span::new(150, 250);
        let c = Span::new(200, 300);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c)); // adjacent, not overlapping
    }

    #[test]
    fn empty_room_is_available() {
        let room = Room::new("1D");
        assert!(room.is_available(0, 1000));
        assert!(room.bookings().is_empty());
    }

    #[test]
    fn add_booking_keeps_start_order() {
        let mut room = Room::new("1D");
        assert!(room.add_booking(booking("c", 300, 400)));
        assert!(room.add_booking(booking("a", 100, 200)));
        assert!(room.add_booking(booking("b", 200, 300)));
        let ids: Vec<_> = room.bookings().iter().map(Booking::id).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn add_booking_rejects_overlap() {
        let mut room = Room::new("1D");
        assert!(room.add_booking(booking("a", 100, 200)));
        assert!(!room.add_booking(booking("b", 150, 250)));
        assert!(!room.add_booking(booking("c", 0, 1000)));
        assert_eq!(room.bookings().len(), 1);
    }

    #[test]
    fn add_booking_rejects_foreign_room_and_duplicate_id() {
        let mut room = Room::new("1D");
        assert!(!room.add_booking(Booking::new("x", "2A", Span::new(100, 200))));
        assert!(room.add_booking(booking("a", 100, 200)));
        assert!(!room.add_booking(booking("a", 500, 600)));
        assert_eq!(room.bookings().len(), 1);
    }

    #[test]
    fn availability_is_half_open() {
        let mut room = Room::new("1D");
        room.add_booking(booking("a", 100, 200));
        assert!(room.is_available(200, 300));
        assert!(room.is_available(0, 100));
        assert!(!room.is_available(199, 300));
        assert!(!room.is_available(0, 101));
        assert!(!room.is_available(120, 180));
    }

    #[test]
    fn lookup_and_cancel() {
        let mut room = Room::new("1D");
        room.add_booking(booking("a", 100, 200));
        assert!(room.has_booking("a"));
        assert_eq!(room.get_booking("a").map(Booking::start), Some(100));
        assert!(!room.has_booking("missing"));

        let removed = room.cancel_booking("a").unwrap();
        assert_eq!(removed.id(), "a");
        assert!(!room.has_booking("a"));
        assert!(room.is_available(100, 200));
        assert!(room.cancel_booking("a").is_none());
    }

    #[test]
    fn overlapping_skips_past_and_future() {
        let mut room = Room::new("1D");
        room.add_booking(booking("past", 100, 200));
        room.add_booking(booking("hit", 450, 600));
        room.add_booking(booking("future", 1000, 1100));

        let hits: Vec<_> = room.overlapping(&Span::new(500, 800)).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "hit");
    }

    #[test]
    fn room_serializes_with_bookings() {
        let mut room = Room::with_name("1D", "Konferensrum");
        room.add_booking(booking("a", 100, 200));
        let json = serde_json::to_string(&room).unwrap();
        let decoded: Room = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, room);
        assert_eq!(decoded.name(), Some("Konferensrum"));
    }

    #[test]
    fn add_booking_rejects_inverted_and_empty_span() {
        let mut room = Room::new("1D");
        let inverted = Booking::new("x", "1D", Span { start: 200, end: 100 });
        assert_eq!(
            room.try_add_booking(inverted),
            Err(RoomError::EmptySpan("x".into()))
        );
        let empty = Booking::new("y", "1D", Span { start: 200, end: 200 });
        assert!(!room.add_booking(empty));
        assert!(room.bookings().is_empty());
    }

    #[test]
    fn try_add_booking_names_the_conflict() {
        let mut room = Room::new("1D");
        room.add_booking(booking("a", 100, 200));
        assert_eq!(
            room.try_add_booking(booking("b", 150, 250)),
            Err(RoomError::Overlap {
                booking_id: "b".into(),
                existing: "a".into()
            })
        );
        assert_eq!(
            room.try_add_booking(booking("a", 500, 600)),
            Err(RoomError::DuplicateBooking("a".into()))
        );
    }

    fn booking_json(id: &str, room_id: &str, start: Ms, end: Ms) -> String {
        format!(r#"{{"id":"{id}","room_id":"{room_id}","span":{{"start":{start},"end":{end}}}}}"#)
    }

    fn room_json(bookings: &[String]) -> String {
        format!(r#"{{"id":"1D","name":null,"bookings":[{}]}}"#, bookings.join(","))
    }

    #[test]
    fn deserialize_sorts_unordered_bookings() {
        let json = room_json(&[
            booking_json("late", "1D", 5000, 6000),
            booking_json("late2", "1D", 6000, 7000),
            booking_json("early", "1D", 100, 200),
        ]);
        let room: Room = serde_json::from_str(&json).unwrap();
        let ids: Vec<_> = room.bookings().iter().map(Booking::id).collect();
        assert_eq!(ids, ["early", "late", "late2"]);
        assert!(!room.is_available(150, 160));
        assert!(room.is_available(200, 5000));
    }

    #[test]
    fn deserialize_rejects_overlapping_bookings() {
        let json = room_json(&[
            booking_json("a", "1D", 100, 300),
            booking_json("b", "1D", 200, 400),
        ]);
        let err = serde_json::from_str::<Room>(&json).unwrap_err();
        assert!(err.to_string().contains("booking b overlaps a"));
    }

    #[test]
    fn deserialize_rejects_duplicate_ids() {
        let json = room_json(&[
            booking_json("a", "1D", 100, 200),
            booking_json("a", "1D", 300, 400),
        ]);
        assert!(serde_json::from_str::<Room>(&json).is_err());
    }

    #[test]
    fn deserialize_rejects_foreign_booking() {
        let json = room_json(&[booking_json("a", "2B", 100, 200)]);
        let err = serde_json::from_str::<Room>(&json).unwrap_err();
        assert!(err.to_string().contains("belongs to room 2B"));
    }

    #[test]
    fn deserialize_rejects_inverted_span() {
        let json = room_json(&[booking_json("a", "1D", 200, 100)]);
        let err = serde_json::from_str::<Room>(&json).unwrap_err();
        assert!(err.to_string().contains("end must be after start"));
    }

    #[test]
    fn deserialize_accepts_missing_optional_fields() {
        let room: Room = serde_json::from_str(r#"{"id":"1D"}"#).unwrap();
        assert_eq!(room, Room::new("1D"));
    }
}
