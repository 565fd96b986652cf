use async_trait::async_trait;

use crate::{
    domain::{RoomId, UserId},
    messaging::types::MessageContent,
    Result,
};

/// Transport port.
///
/// The Matrix adapter implements this over `matrix-sdk`; tests use in-memory fakes.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Identity of the logged-in account (the exempt sender).
    fn own_user_id(&self) -> &UserId;

    /// Send a `m.room.message` event with the given content.
    async fn send(&self, room: &RoomId, content: MessageContent) -> Result<()>;

    /// Upload raw bytes to the media repository and return the resource handle
    /// (an `mxc://` URI). The MIME type is derived from `filename`.
    async fn upload(&self, data: Vec<u8>, filename: &str) -> Result<String>;
}
