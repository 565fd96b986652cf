use std::fmt;

/// Matrix user id, e.g. `@alice:example.org`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub String);

/// Matrix room id, e.g. `!abc:example.org`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RoomId(pub String);

/// Matrix event id, e.g. `$xyz`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The room a message arrived in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomRef {
    pub id: RoomId,
    pub display_name: String,
}

/// One inbound text message, as seen by the dispatcher.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub room: RoomRef,
    pub event_id: EventId,
    pub sender: UserId,
    pub body: String,
    /// The event carries an `m.replace` relation (it is an edit of another event).
    pub is_edit: bool,
}
