use async_trait::async_trait;

use crate::{
    context::BotContext,
    formatting::escape_html,
    Result,
};

use super::{CommandContext, CommandHandler};

pub struct Help;

#[async_trait]
impl CommandHandler for Help {
    async fn run(&self, bot: &BotContext, ctx: &CommandContext<'_>) -> Result<()> {
        let settings = &bot.settings;

        let text = match ctx.args.first() {
            None => {
                let source = settings
                    .source_url
                    .as_deref()
                    .map(|url| format!("\n<a href=\"{}\">Source Code</a>", escape_html(url)))
                    .unwrap_or_default();
                let help = settings
                    .help_text("help")
                    .unwrap_or_else(|| "No help available.".to_string());
                format!("{help}{source}")
            }
            Some(arg) => {
                // `help !roll` and `help roll` both work.
                let arg = arg.to_lowercase();
                let key = arg.rsplit(settings.prefix.as_str()).next().unwrap_or(&arg);
                match settings.help_text(key) {
                    Some(usage) => format!("Usage:\n{usage}\n"),
                    None => "Unknown command!".to_string(),
                }
            }
        };

        bot.responder.send_text(&ctx.room.id, &text).await
    }
}
