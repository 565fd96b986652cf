use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    cache::{CacheEntries, ContentCache},
    comics::{ComicSource, XkcdClient},
    config::Settings,
    domain::UserId,
    emoji::{EmojiAssets, EmojiExpander, EmojiIndex, EmojiIndexData},
    media::{ImageResizer, PngResizer},
    messaging::{port::MessagingPort, responder::Responder},
    probe::{HostProbe, SystemPing},
    store::{JsonFileStore, Store},
    text_macros::TextReplacements,
    Result,
};

/// Everything the bot core talks to besides the transport.
pub struct Collaborators {
    pub cache_store: Box<dyn Store<CacheEntries>>,
    pub emoji_store: Box<dyn Store<EmojiIndexData>>,
    pub text: TextReplacements,
    pub assets: EmojiAssets,
    pub resizer: Arc<dyn ImageResizer>,
    pub comics: Arc<dyn ComicSource>,
    pub probe: Arc<dyn HostProbe>,
}

impl Collaborators {
    /// File-backed stores and real collaborators at the paths from `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        let text_store =
            JsonFileStore::<BTreeMap<String, String>>::new(&settings.text_replace_path);

        Self {
            cache_store: Box::new(JsonFileStore::<CacheEntries>::new(&settings.file_cache_path)),
            emoji_store: Box::new(JsonFileStore::<EmojiIndexData>::new(&settings.emojis_path)),
            text: TextReplacements::load(&text_store),
            assets: EmojiAssets::new(&settings.emojis_folder_path),
            resizer: Arc::new(PngResizer),
            comics: Arc::new(XkcdClient::new(&settings.cache_path)),
            probe: Arc::new(SystemPing),
        }
    }
}

/// Shared state handed to the dispatcher and every command handler.
///
/// Mutable tables sit behind async mutexes. When both are needed the emoji
/// index is locked before the file cache.
pub struct BotContext {
    pub settings: Arc<Settings>,
    pub responder: Responder,
    pub cache: Mutex<ContentCache>,
    pub emojis: Mutex<EmojiIndex>,
    pub expander: EmojiExpander,
    pub text: TextReplacements,
    pub comics: Arc<dyn ComicSource>,
    pub probe: Arc<dyn HostProbe>,
}

impl BotContext {
    pub fn new(
        settings: Arc<Settings>,
        messenger: Arc<dyn MessagingPort>,
        parts: Collaborators,
    ) -> Self {
        let responder = Responder::new(messenger, settings.source_url.clone());
        let cache = ContentCache::open(parts.cache_store);
        let emojis = EmojiIndex::open(parts.emoji_store);
        tracing::info!(
            cached_files = cache.len(),
            default_emoji_size = emojis.default_size(),
            text_macros = parts.text.len(),
            "bot state loaded"
        );

        Self {
            settings,
            responder,
            cache: Mutex::new(cache),
            emojis: Mutex::new(emojis),
            expander: EmojiExpander::new(parts.assets, parts.resizer),
            text: parts.text,
            comics: parts.comics,
            probe: parts.probe,
        }
    }

    pub fn own_user_id(&self) -> &UserId {
        self.responder.messenger().own_user_id()
    }

    /// Upload through the content cache.
    ///
    /// The cache lock is held across the network call, so two concurrent
    /// uploads of the same bytes still reach the homeserver only once.
    pub async fn upload(&self, data: Vec<u8>, filename: &str) -> Result<String> {
        let mut cache = self.cache.lock().await;
        cache
            .upload(self.responder.messenger().as_ref(), data, filename)
            .await
    }

    /// Run the macro pipeline: emoji expansion first, then text replacement.
    pub async fn expand_macros(&self, body: &str) -> Result<String> {
        let expanded = {
            let mut emojis = self.emojis.lock().await;
            let mut cache = self.cache.lock().await;
            self.expander
                .expand(
                    body,
                    &mut emojis,
                    &mut cache,
                    self.responder.messenger().as_ref(),
                )
                .await?
        };
        Ok(self.text.replace(&expanded))
    }
}
