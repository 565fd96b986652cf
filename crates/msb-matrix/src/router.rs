use std::{sync::Arc, time::Duration};

use anyhow::{Context as _, Result};
use matrix_sdk::{
    config::SyncSettings,
    room::Room,
    ruma::events::room::{
        encrypted::OriginalSyncRoomEncryptedEvent,
        message::{MessageType, OriginalSyncRoomMessageEvent, Relation},
    },
    Client,
};
use tokio::time::sleep;

use msb_core::{
    commands::CommandRegistry,
    config::Settings,
    context::{BotContext, Collaborators},
    dispatcher::Dispatcher,
    domain::{EventId, IncomingMessage, RoomId, RoomRef, UserId},
    messaging::port::MessagingPort,
};

use crate::{
    session::{self, Credentials},
    MatrixMessenger,
};

const SYNC_TIMEOUT: Duration = Duration::from_secs(30);
const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Log in, wire the dispatcher to room events and sync until an error ends
/// the loop (only in debug mode) or the process is stopped.
pub async fn run(settings: Arc<Settings>) -> Result<()> {
    let creds = Credentials::load(&settings.credentials_path)?;
    let client = session::connect(&creds).await?;
    drop(creds);

    let messenger = Arc::new(MatrixMessenger::new(client.clone())?);
    tracing::info!(user = %messenger.own_user_id(), "logged in");

    let parts = Collaborators::from_settings(&settings);
    let bot = Arc::new(BotContext::new(settings.clone(), messenger, parts));
    let dispatcher = Arc::new(Dispatcher::new(bot, CommandRegistry::builtin()));

    // Skip the backlog: handlers only see events after this first sync.
    let response = client
        .sync_once(SyncSettings::default())
        .await
        .context("initial sync")?;

    register_handlers(&client, dispatcher);

    let mut sync = SyncSettings::default()
        .token(response.next_batch)
        .timeout(SYNC_TIMEOUT);
    tracing::info!("listening for messages");

    loop {
        match client.sync_once(sync.clone()).await {
            Ok(response) => sync = sync.token(response.next_batch),
            Err(e) if settings.debug => {
                return Err(e).context("sync failed (debug mode, exiting)");
            }
            Err(e) => {
                tracing::warn!(error = %e, "sync failed; retrying");
                sleep(RETRY_PAUSE).await;
            }
        }
    }
}

fn register_handlers(client: &Client, dispatcher: Arc<Dispatcher>) {
    client.add_event_handler(move |ev: OriginalSyncRoomMessageEvent, room: Room| {
        let dispatcher = dispatcher.clone();
        async move {
            let Some(msg) = incoming_message(&ev, &room) else {
                return;
            };
            tracing::debug!(room = %msg.room.display_name, sender = %msg.sender, body = %msg.body, "message");

            match dispatcher.handle(&msg).await {
                Ok(outcome) => tracing::debug!(?outcome, event = %msg.event_id, "handled"),
                Err(e) => tracing::error!(error = %e, event = %msg.event_id, "message handling failed"),
            }
        }
    });

    client.add_event_handler(|ev: OriginalSyncRoomEncryptedEvent, room: Room| async move {
        tracing::warn!(
            room = %room.room_id(),
            sender = %ev.sender,
            event = %ev.event_id,
            "failed to decrypt message"
        );
    });
}

/// Text messages only; everything else is not for the dispatcher.
fn incoming_message(ev: &OriginalSyncRoomMessageEvent, room: &Room) -> Option<IncomingMessage> {
    let (body, is_edit) = text_body(ev)?;

    let room_id = room.room_id().to_string();
    Some(IncomingMessage {
        room: RoomRef {
            display_name: room.name().unwrap_or_else(|| room_id.clone()),
            id: RoomId(room_id),
        },
        event_id: EventId(ev.event_id.to_string()),
        sender: UserId(ev.sender.to_string()),
        body: body.to_string(),
        is_edit,
    })
}

/// Body of an `m.text` message and whether it replaces an earlier event.
fn text_body(ev: &OriginalSyncRoomMessageEvent) -> Option<(&str, bool)> {
    let MessageType::Text(text) = &ev.content.msgtype else {
        return None;
    };
    let is_edit = matches!(ev.content.relates_to, Some(Relation::Replacement(_)));
    Some((text.body.as_str(), is_edit))
}
