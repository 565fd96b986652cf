use async_trait::async_trait;

use crate::{
    comics::XKCD_BASE_URL, context::BotContext, formatting::escape_html, Result,
};

use super::{is_decimal, CommandContext, CommandHandler};

const FAILURE_REPLY: &str = "Failed to get XKCD!";

/// Posts an xkcd comic (latest, or by number): a caption line, then the image.
pub struct Xkcd;

#[async_trait]
impl CommandHandler for Xkcd {
    async fn run(&self, bot: &BotContext, ctx: &CommandContext<'_>) -> Result<()> {
        let number = match ctx.args {
            [arg] if is_decimal(arg) => arg.parse::<u32>().ok(),
            _ => None,
        };

        // Fetch and upload failures are reported in the room, not propagated.
        if let Err(e) = post_comic(bot, ctx, number).await {
            tracing::warn!(error = %e, ?number, "xkcd command failed");
            return bot.responder.send_text(&ctx.room.id, FAILURE_REPLY).await;
        }
        Ok(())
    }
}

async fn post_comic(bot: &BotContext, ctx: &CommandContext<'_>, number: Option<u32>) -> Result<()> {
    let comic = bot.comics.fetch(number).await?;
    let (bytes, file_name) = bot.comics.image(&comic).await?;
    let handle = bot.upload(bytes, &file_name).await?;

    let caption = format!(
        "{}/{}/{}, {num}: <a href=\"{XKCD_BASE_URL}/{num}/\">{}</a>",
        comic.year,
        comic.month,
        comic.day,
        escape_html(&comic.safe_title),
        num = comic.num,
    );
    bot.responder.send_text(&ctx.room.id, &caption).await?;
    bot.responder
        .send_image(&ctx.room.id, &handle, &comic.alt)
        .await
}
