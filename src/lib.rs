pub mod booking;
pub mod clock;
pub mod config;
pub mod model;
pub mod notify;
pub mod observability;
pub mod store;

pub use booking::{BookingError, BookingSystem};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use model::{Booking, Ms, Room, RoomError, Span};
pub use notify::{NotificationError, Notifier, NotifyHub};
pub use store::{InMemoryRoomStore, RoomStore};
