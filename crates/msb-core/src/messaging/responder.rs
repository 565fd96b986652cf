use std::sync::Arc;

use crate::{
    domain::{EventId, RoomId},
    formatting::{compose_edit, compose_message},
    messaging::{
        port::MessagingPort,
        types::{ImageContent, MessageContent},
    },
    Result,
};

/// Send / edit helper shared by the dispatcher and command handlers.
#[derive(Clone)]
pub struct Responder {
    messenger: Arc<dyn MessagingPort>,
    source_url: Option<String>,
}

impl Responder {
    pub fn new(messenger: Arc<dyn MessagingPort>, source_url: Option<String>) -> Self {
        Self {
            messenger,
            source_url,
        }
    }

    pub fn messenger(&self) -> &Arc<dyn MessagingPort> {
        &self.messenger
    }

    /// Send a new, signed message.
    pub async fn send_text(&self, room: &RoomId, text: &str) -> Result<()> {
        let content = compose_message(text, self.source_url.as_deref());
        self.messenger.send(room, MessageContent::Text(content)).await
    }

    /// Replace `event` with `text`.
    pub async fn edit_text(&self, room: &RoomId, event: &EventId, text: &str) -> Result<()> {
        let content = compose_edit(&event.0, text);
        self.messenger.send(room, MessageContent::Text(content)).await
    }

    pub async fn send_image(&self, room: &RoomId, handle: &str, text: &str) -> Result<()> {
        self.messenger
            .send(room, MessageContent::Image(ImageContent::new(handle, text)))
            .await
    }
}
