//! Matrix adapter (matrix-sdk).
//!
//! This crate implements the `msb-core` MessagingPort over the Matrix
//! client-server API and feeds room events into the core dispatcher.

use async_trait::async_trait;
use matrix_sdk::{ruma::OwnedRoomId, Client};

pub mod router;
pub mod session;

use msb_core::{
    domain::{RoomId, UserId},
    errors::Error,
    messaging::{port::MessagingPort, types::MessageContent},
    Result,
};

const ROOM_MESSAGE: &str = "m.room.message";

#[derive(Clone)]
pub struct MatrixMessenger {
    client: Client,
    own: UserId,
}

impl MatrixMessenger {
    /// Wrap a logged-in client.
    pub fn new(client: Client) -> Result<Self> {
        let own = client
            .user_id()
            .map(|id| UserId(id.to_string()))
            .ok_or_else(|| Error::Config("matrix client is not logged in".to_string()))?;
        Ok(Self { client, own })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn map_err(e: matrix_sdk::Error) -> Error {
        Error::External(format!("matrix error: {e}"))
    }

    fn room(&self, room: &RoomId) -> Result<matrix_sdk::Room> {
        let id: OwnedRoomId = room
            .0
            .parse()
            .map_err(|e| Error::External(format!("invalid room id {room}: {e}")))?;
        self.client
            .get_room(&id)
            .ok_or_else(|| Error::External(format!("unknown room {room}")))
    }
}

#[async_trait]
impl MessagingPort for MatrixMessenger {
    fn own_user_id(&self) -> &UserId {
        &self.own
    }

    async fn send(&self, room: &RoomId, content: MessageContent) -> Result<()> {
        let room = self.room(room)?;
        let content = serde_json::to_value(&content)?;
        room.send_raw(ROOM_MESSAGE, content)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn upload(&self, data: Vec<u8>, filename: &str) -> Result<String> {
        let mime = mime_guess::from_path(filename).first_or_octet_stream();
        let response = self
            .client
            .media()
            .upload(&mime, data, None)
            .await
            .map_err(|e| Error::UploadFailed(format!("{filename}: {e}")))?;
        Ok(response.content_uri.to_string())
    }
}
