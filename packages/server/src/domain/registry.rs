//! In-memory directory of active rooms.
//!
//! Rooms are keyed by the chat context they were started from. A room
//! restored from the store after a restart has no known context and is
//! keyed by its own room id instead.

use std::collections::HashMap;

use super::{
    room::{GameSettings, Room},
    value_object::{ContextId, PlayerId, RoomId},
};

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    /// room id → registry key
    room_index: HashMap<RoomId, String>,
    settings: GameSettings,
}

impl RoomRegistry {
    pub fn new(settings: GameSettings) -> Self {
        Self {
            rooms: HashMap::new(),
            room_index: HashMap::new(),
            settings,
        }
    }

    pub fn settings(&self) -> GameSettings {
        self.settings
    }

    /// The only writer of the process-wide defaults.
    pub fn update_settings(&mut self, settings: GameSettings) {
        tracing::info!(?settings, "Default game settings updated");
        self.settings = settings;
    }

    /// Registers `room` under `context`, replacing (and returning) whatever
    /// room was registered there before.
    pub fn insert(&mut self, context: &ContextId, room: Room) -> Option<Room> {
        self.insert_keyed(context.as_str().to_string(), room)
    }

    /// Registers a room whose context is unknown, keyed by its room id.
    pub fn insert_recovered(&mut self, room: Room) -> Option<Room> {
        let key = room.room_id.as_str().to_string();
        self.insert_keyed(key, room)
    }

    fn insert_keyed(&mut self, key: String, room: Room) -> Option<Room> {
        let previous = self.rooms.remove(&key);
        if let Some(previous) = &previous {
            self.room_index.remove(&previous.room_id);
        }
        self.room_index.insert(room.room_id.clone(), key.clone());
        self.rooms.insert(key, room);
        previous
    }

    pub fn by_context(&self, context: &ContextId) -> Option<&Room> {
        self.rooms.get(context.as_str())
    }

    pub fn by_room_id(&self, room_id: &RoomId) -> Option<&Room> {
        let key = self.room_index.get(room_id)?;
        self.rooms.get(key)
    }

    pub fn by_room_id_mut(&mut self, room_id: &RoomId) -> Option<&mut Room> {
        let key = self.room_index.get(room_id)?;
        self.rooms.get_mut(key)
    }

    /// First room (in no particular order) whose GM is `gm_id`.
    pub fn by_gm(&self, gm_id: &PlayerId) -> Option<&Room> {
        self.rooms.values().find(|room| room.gm_id == *gm_id)
    }

    /// Resolves the room a GM command refers to: the room of this context,
    /// a room whose id equals the context value, or a room run by the actor.
    pub fn resolve_command_room(&self, context: &ContextId, actor: &PlayerId) -> Option<RoomId> {
        if let Some(room) = self.by_context(context) {
            return Some(room.room_id.clone());
        }
        if let Some(room) = self
            .rooms
            .values()
            .find(|room| room.room_id.as_str() == context.as_str())
        {
            return Some(room.room_id.clone());
        }
        self.by_gm(actor).map(|room| room.room_id.clone())
    }

    /// Removes the room; its role assignment and votes go with it.
    pub fn remove(&mut self, room_id: &RoomId) -> Option<Room> {
        let key = self.room_index.remove(room_id)?;
        self.rooms.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }
}
