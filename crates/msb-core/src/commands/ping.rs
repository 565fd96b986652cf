use async_trait::async_trait;

use crate::{context::BotContext, formatting::escape_html, Result};

use super::{CommandContext, CommandHandler};

/// Liveness check. The bot's own account may also probe an external host.
pub struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn run(&self, bot: &BotContext, ctx: &CommandContext<'_>) -> Result<()> {
        let host = ctx
            .args
            .first()
            .filter(|_| ctx.message.sender == *bot.own_user_id());

        let text = match host {
            None => format!(
                "Selfbot is online and accepting messages in {}.",
                escape_html(&ctx.room.display_name)
            ),
            Some(host) => {
                let outcome = if bot.probe.ping(host).await {
                    "successful"
                } else {
                    "unsuccessful"
                };
                format!("Ping to {} was {outcome}", escape_html(host))
            }
        };

        bot.responder.send_text(&ctx.room.id, &text).await
    }
}
