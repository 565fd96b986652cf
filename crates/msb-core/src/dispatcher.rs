//! Per-message state machine: edit filter, command path, macro path.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    commands::{CommandContext, CommandRegistry},
    context::BotContext,
    domain::IncomingMessage,
    ratelimit::RateLimiter,
    Result,
};

/// What the dispatcher did with one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The event replaces an earlier one; edits are never reprocessed.
    IgnoredEdit,
    RateLimited,
    /// Prefixed message naming no command the sender may run.
    UnknownCommand(String),
    Command(String),
    /// The macro pipeline changed the bot's own message and it was edited.
    Edited,
    Unchanged,
    /// Non-command message from someone else.
    NotOwn,
}

pub struct Dispatcher {
    bot: Arc<BotContext>,
    registry: CommandRegistry,
    rate_limiter: Mutex<RateLimiter>,
}

impl Dispatcher {
    pub fn new(bot: Arc<BotContext>, registry: CommandRegistry) -> Self {
        let rate_limiter = Mutex::new(RateLimiter::new(bot.settings.ratelimit));
        Self {
            bot,
            registry,
            rate_limiter,
        }
    }

    pub fn bot(&self) -> &Arc<BotContext> {
        &self.bot
    }

    pub async fn handle(&self, msg: &IncomingMessage) -> Result<Outcome> {
        self.handle_at(msg, chrono::Utc::now().timestamp()).await
    }

    /// `handle` with an explicit clock (epoch seconds) for the rate limiter.
    pub async fn handle_at(&self, msg: &IncomingMessage, now: i64) -> Result<Outcome> {
        if msg.is_edit {
            return Ok(Outcome::IgnoredEdit);
        }

        let is_self = msg.sender == *self.bot.own_user_id();
        match parse_command(&msg.body, &self.bot.settings.prefix) {
            Some((command, args)) => self.run_command(msg, command, args, is_self, now).await,
            None if is_self => self.run_macros(msg).await,
            None => Ok(Outcome::NotOwn),
        }
    }

    async fn run_command(
        &self,
        msg: &IncomingMessage,
        command: String,
        args: Vec<String>,
        is_self: bool,
        now: i64,
    ) -> Result<Outcome> {
        let allowed = self
            .rate_limiter
            .lock()
            .await
            .allow_at(&msg.sender, is_self, now);
        if !allowed {
            tracing::debug!(sender = %msg.sender, %command, "rate limited");
            return Ok(Outcome::RateLimited);
        }

        let settings = &self.bot.settings;
        let permitted = settings.is_general_command(&command)
            || (is_self && settings.is_admin_command(&command));
        let handler = match self.registry.get(&command) {
            Some(handler) if permitted => handler,
            _ => return Ok(Outcome::UnknownCommand(command)),
        };

        tracing::info!(sender = %msg.sender, room = %msg.room.id, %command, ?args, "running command");
        let ctx = CommandContext {
            args: &args,
            room: &msg.room,
            message: msg,
        };
        handler.run(&self.bot, &ctx).await?;
        Ok(Outcome::Command(command))
    }

    /// Emoji expansion, then text replacement, then edit if anything changed.
    async fn run_macros(&self, msg: &IncomingMessage) -> Result<Outcome> {
        let expanded = match self.bot.expand_macros(&msg.body).await {
            Ok(expanded) => expanded,
            Err(e) => {
                tracing::warn!(error = %e, event = %msg.event_id, "macro expansion failed; message left as is");
                return Ok(Outcome::Unchanged);
            }
        };

        if expanded == msg.body {
            return Ok(Outcome::Unchanged);
        }

        self.bot
            .responder
            .edit_text(&msg.room.id, &msg.event_id, &expanded)
            .await?;
        Ok(Outcome::Edited)
    }
}

/// Split a prefixed body into a lower-cased command and its arguments.
///
/// The prefix matches case-insensitively. Returns `None` for non-command
/// bodies.
pub fn parse_command(body: &str, prefix: &str) -> Option<(String, Vec<String>)> {
    let head = body.get(..prefix.len())?;
    if head.to_lowercase() != prefix.to_lowercase() {
        return None;
    }

    let mut tokens = body[prefix.len()..].split_whitespace();
    let command = match body[prefix.len()..].chars().next() {
        // `! roll` names no command.
        Some(c) if c.is_whitespace() => String::new(),
        _ => tokens.next().unwrap_or_default().to_lowercase(),
    };
    let args = tokens.map(str::to_string).collect();
    Some((command, args))
}
