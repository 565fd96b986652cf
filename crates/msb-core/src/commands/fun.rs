use async_trait::async_trait;
use rand::Rng;

use crate::{context::BotContext, Result};

use super::{is_decimal, CommandContext, CommandHandler};

const SHRUG: &str = "¯\\_(ツ)_/¯";
const DEFAULT_SIDES: u64 = 6;

/// Rewrites the triggering message with a shrug appended.
pub struct Shrug;

#[async_trait]
impl CommandHandler for Shrug {
    async fn run(&self, bot: &BotContext, ctx: &CommandContext<'_>) -> Result<()> {
        let command = format!("{}shrug", bot.settings.prefix);
        let body = &ctx.message.body;

        let text = if *body == command {
            SHRUG.to_string()
        } else {
            let rest = body
                .replace(&format!("{command} "), "")
                .replace(&command, "");
            format!("{rest} {SHRUG}")
        };

        bot.responder
            .edit_text(&ctx.room.id, &ctx.message.event_id, &text)
            .await
    }
}

pub struct Roll;

#[async_trait]
impl CommandHandler for Roll {
    async fn run(&self, bot: &BotContext, ctx: &CommandContext<'_>) -> Result<()> {
        let sides = ctx
            .args
            .first()
            .filter(|a| is_decimal(a))
            .and_then(|a| a.parse::<u64>().ok())
            .filter(|&s| s >= 1)
            .unwrap_or(DEFAULT_SIDES);

        let rolled = rand::rng().random_range(1..=sides);
        bot.responder
            .send_text(&ctx.room.id, &format!("You rolled a {rolled}!"))
            .await
    }
}
