mod error;

pub use error::{BookingError, messages};

use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::clock::Clock;
use crate::model::*;
use crate::notify::Notifier;
use crate::observability::{
    AVAILABLE_ROOMS, BOOKINGS_TOTAL, CANCELLATIONS_TOTAL, NOTIFICATION_FAILURES_TOTAL,
};
use crate::store::RoomStore;

/// Booking front door: validates requests and drives the room store.
///
/// Writes to a room are serialized by a per-room lock held across
/// read → check → mutate → save, so overlapping requests for the same room
/// cannot both succeed. Different rooms never contend.
pub struct BookingSystem<C, S, N> {
    clock: C,
    store: S,
    notifier: N,
    room_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<C: Clock, S: RoomStore, N: Notifier> BookingSystem<C, S, N> {
    pub fn new(clock: C, store: S, notifier: N) -> Self {
        Self {
            clock,
            store,
            notifier,
            room_locks: DashMap::new(),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn room_lock(&self, room_id: &str) -> Arc<Mutex<()>> {
        self.room_locks
            .entry(room_id.to_owned())
            .or_default()
            .value()
            .clone()
    }

    /// Book `room_id` for `[start, end)`.
    ///
    /// `Ok(false)` means the room is taken for that window; nothing is written.
    pub fn book_room(
        &self,
        room_id: Option<&str>,
        start: Option<Ms>,
        end: Option<Ms>,
    ) -> Result<bool, BookingError> {
        let result = self.try_book_room(room_id, start, end);
        let status = match &result {
            Ok(true) => "booked",
            Ok(false) => "unavailable",
            Err(_) => "rejected",
        };
        metrics::counter!(BOOKINGS_TOTAL, "status" => status).increment(1);
        result
    }

    fn try_book_room(
        &self,
        room_id: Option<&str>,
        start: Option<Ms>,
        end: Option<Ms>,
    ) -> Result<bool, BookingError> {
        let (Some(room_id), Some(start), Some(end)) = (room_id, start, end) else {
            return Err(BookingError::InvalidArgument(messages::BOOKING_FIELDS_REQUIRED));
        };
        let now = self.clock.now();
        if start < now {
            debug!(room_id, start, now, "booking rejected: start in the past");
            return Err(BookingError::InvalidArgument(messages::START_IN_PAST));
        }
        if end <= start {
            return Err(BookingError::InvalidArgument(messages::END_NOT_AFTER_START));
        }
        if self.store.find_by_id(room_id).is_none() {
            debug!(room_id, "booking rejected: unknown room");
            return Err(BookingError::InvalidArgument(messages::ROOM_NOT_FOUND));
        }

        let lock = self.room_lock(room_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Re-read under the lock; the copy above may already be stale.
        let mut room = self
            .store
            .find_by_id(room_id)
            .ok_or(BookingError::InvalidArgument(messages::ROOM_NOT_FOUND))?;

        let booking = Booking::new(Ulid::new().to_string(), room_id, Span::new(start, end));
        let booking_id = booking.id().to_owned();
        if !room.add_booking(booking) {
            debug!(room_id, start, end, "room unavailable");
            return Ok(false);
        }

        self.store.save(room);
        info!(room_id, %booking_id, start, end, "room booked");
        Ok(true)
    }

    /// Rooms with no booking overlapping `[start, end)`, in store order.
    pub fn get_available_rooms(
        &self,
        start: Option<Ms>,
        end: Option<Ms>,
    ) -> Result<Vec<Room>, BookingError> {
        let (Some(start), Some(end)) = (start, end) else {
            return Err(BookingError::InvalidArgument(messages::WINDOW_REQUIRED));
        };
        if end <= start {
            return Err(BookingError::InvalidArgument(messages::END_NOT_AFTER_START));
        }

        let rooms: Vec<Room> = self
            .store
            .find_all()
            .into_iter()
            .filter(|room| room.is_available(start, end))
            .collect();
        metrics::histogram!(AVAILABLE_ROOMS).record(rooms.len() as f64);
        debug!(start, end, available = rooms.len(), "available rooms");
        Ok(rooms)
    }

    /// Cancel a booking that has not started yet.
    ///
    /// `Ok(false)` means no room owns `booking_id`. Once the cancellation is
    /// saved the result is `Ok(true)`, whatever the notifier does.
    pub fn cancel_booking(&self, booking_id: Option<&str>) -> Result<bool, BookingError> {
        let result = self.try_cancel_booking(booking_id);
        let status = match &result {
            Ok(true) => "cancelled",
            Ok(false) => "not_found",
            Err(_) => "rejected",
        };
        metrics::counter!(CANCELLATIONS_TOTAL, "status" => status).increment(1);
        result
    }

    fn try_cancel_booking(&self, booking_id: Option<&str>) -> Result<bool, BookingError> {
        let Some(booking_id) = booking_id else {
            return Err(BookingError::InvalidArgument(messages::BOOKING_ID_REQUIRED));
        };
        let Some(owner) = self
            .store
            .find_all()
            .into_iter()
            .find(|room| room.has_booking(booking_id))
        else {
            debug!(booking_id, "cancel: no room owns booking");
            return Ok(false);
        };

        let lock = self.room_lock(owner.id());
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // A concurrent cancel may have won the race.
        let Some(mut room) = self.store.find_by_id(owner.id()) else {
            return Ok(false);
        };
        let Some(booking) = room.get_booking(booking_id).cloned() else {
            debug!(booking_id, "cancel: booking already gone");
            return Ok(false);
        };

        let now = self.clock.now();
        if booking.start() <= now {
            debug!(booking_id, start = booking.start(), now, "cancel rejected: booking started");
            return Err(BookingError::IllegalState(messages::BOOKING_ALREADY_STARTED));
        }

        room.cancel_booking(booking_id);
        self.store.save(room);
        drop(guard);
        info!(booking_id, room_id = booking.room_id(), "booking cancelled");

        if let Err(e) = self.notifier.send_cancellation_confirmation(&booking) {
            metrics::counter!(NOTIFICATION_FAILURES_TOTAL).increment(1);
            warn!(booking_id, "cancellation confirmation not delivered: {e}");
        }
        Ok(true)
    }

    /// Look up a booking in whichever room owns it.
    pub fn find_booking(&self, booking_id: &str) -> Option<Booking> {
        self.store
            .find_all()
            .into_iter()
            .find_map(|room| room.get_booking(booking_id).cloned())
    }

    /// Bookings of one room in start order.
    pub fn room_bookings(&self, room_id: &str) -> Result<Vec<Booking>, BookingError> {
        self.store
            .find_by_id(room_id)
            .map(|room| room.bookings().to_vec())
            .ok_or(BookingError::InvalidArgument(messages::ROOM_NOT_FOUND))
    }
}
