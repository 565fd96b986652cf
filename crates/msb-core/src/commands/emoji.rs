use async_trait::async_trait;

use crate::{context::BotContext, emoji::MAX_EMOJI_SIZE, Result};

use super::{is_decimal, CommandContext, CommandHandler};

/// Sets the size used by `:name:` tokens without an explicit size.
pub struct EmojiSize;

#[async_trait]
impl CommandHandler for EmojiSize {
    async fn run(&self, bot: &BotContext, ctx: &CommandContext<'_>) -> Result<()> {
        let size = match ctx.args {
            [arg] if is_decimal(arg) => arg
                .parse::<u32>()
                .ok()
                .filter(|s| (1..=MAX_EMOJI_SIZE).contains(s)),
            _ => None,
        };

        let Some(size) = size else {
            return bot
                .responder
                .send_text(&ctx.room.id, "Please provide the size argument")
                .await;
        };

        bot.emojis.lock().await.set_default_size(size)?;
        bot.responder
            .send_text(&ctx.room.id, &format!("Set default size to: {size}"))
            .await
    }
}

/// Lists local emoji. The reply itself goes through the macro pipeline when
/// it comes back from sync, so every entry renders as a preview.
pub struct EmojiList;

#[async_trait]
impl CommandHandler for EmojiList {
    async fn run(&self, bot: &BotContext, ctx: &CommandContext<'_>) -> Result<()> {
        let assets = bot.expander.assets().scan()?;
        let default_size = bot.emojis.lock().await.default_size();

        let entries = assets
            .keys()
            .map(|name| format!("{name}: :{name}:24:"))
            .collect::<Vec<_>>()
            .join(", ");
        let text = format!("Default emoji size: {default_size}\nAvailable emojis:\n{entries}");

        bot.responder.send_text(&ctx.room.id, &text).await
    }
}
