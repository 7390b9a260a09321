use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;

use crate::model::Room;

/// Where rooms live between operations.
///
/// Rooms are handed out by value; changes become visible to other callers
/// only after `save`.
pub trait RoomStore: Send + Sync {
    fn find_by_id(&self, id: &str) -> Option<Room>;
    fn find_all(&self) -> Vec<Room>;
    fn save(&self, room: Room);
}

impl<T: RoomStore + ?Sized> RoomStore for Arc<T> {
    fn find_by_id(&self, id: &str) -> Option<Room> {
        (**self).find_by_id(id)
    }

    fn find_all(&self) -> Vec<Room> {
        (**self).find_all()
    }

    fn save(&self, room: Room) {
        (**self).save(room)
    }
}

/// Process-local store. `find_all` returns rooms in first-save order.
pub struct InMemoryRoomStore {
    rooms: DashMap<String, Room>,
    order: RwLock<Vec<String>>,
}

impl Default for InMemoryRoomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            order: RwLock::new(Vec::new()),
        }
    }

    pub fn with_rooms(rooms: impl IntoIterator<Item = Room>) -> Self {
        let store = Self::new();
        for room in rooms {
            store.save(room);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl RoomStore for InMemoryRoomStore {
    fn find_by_id(&self, id: &str) -> Option<Room> {
        self.rooms.get(id).map(|e| e.value().clone())
    }

    fn find_all(&self) -> Vec<Room> {
        let order = self.order.read().unwrap_or_else(PoisonError::into_inner);
        order
            .iter()
            .filter_map(|id| self.find_by_id(id))
            .collect()
    }

    fn save(&self, room: Room) {
        let id = room.id().to_owned();
        if self.rooms.insert(id.clone(), room).is_none() {
            self.order
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(id);
        }
    }
}
