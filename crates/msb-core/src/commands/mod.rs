//! Command registry and builtin handlers.
//!
//! Whether a sender may run a command is decided by the settings' general and
//! admin lists; the registry only maps a name to its handler. A name that is
//! allowed but not registered is a lookup miss, not an error.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::{
    context::BotContext,
    domain::{IncomingMessage, RoomRef},
    Result,
};

mod emoji;
mod fun;
mod help;
mod ping;
mod xkcd;

/// Arguments of one command invocation.
#[derive(Clone, Copy, Debug)]
pub struct CommandContext<'a> {
    pub args: &'a [String],
    pub room: &'a RoomRef,
    pub message: &'a IncomingMessage,
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, bot: &BotContext, ctx: &CommandContext<'_>) -> Result<()>;
}

pub struct CommandRegistry {
    handlers: HashMap<&'static str, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// All builtin commands.
    pub fn builtin() -> Self {
        let builtins: [(&'static str, Arc<dyn CommandHandler>); 7] = [
            ("help", Arc::new(help::Help)),
            ("shrug", Arc::new(fun::Shrug)),
            ("roll", Arc::new(fun::Roll)),
            ("emoji_size", Arc::new(emoji::EmojiSize)),
            ("emoji_list", Arc::new(emoji::EmojiList)),
            ("ping", Arc::new(ping::Ping)),
            ("xkcd", Arc::new(xkcd::Xkcd)),
        ];

        let mut registry = Self::empty();
        for (name, handler) in builtins {
            registry.register(name, handler);
        }
        registry
    }

    pub fn register(&mut self, name: &'static str, handler: Arc<dyn CommandHandler>) {
        self.handlers.insert(name, handler);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Non-empty and all ASCII digits.
pub(crate) fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_lists_every_command() {
        assert_eq!(
            CommandRegistry::builtin().names(),
            vec!["emoji_list", "emoji_size", "help", "ping", "roll", "shrug", "xkcd"]
        );
    }

    #[test]
    fn unknown_name_is_a_miss() {
        assert!(CommandRegistry::builtin().get("rm").is_none());
    }

    #[test]
    fn decimal_check() {
        assert!(is_decimal("20"));
        assert!(!is_decimal(""));
        assert!(!is_decimal("-2"));
        assert!(!is_decimal("2.5"));
    }
}
