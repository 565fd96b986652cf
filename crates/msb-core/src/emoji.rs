//! `:name:` / `:name:SIZE:` emoji macros.
//!
//! Local assets are resized on first use per (size, name), uploaded through
//! the content cache and remembered in the emoji index, so every later use is
//! a plain lookup.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    cache::ContentCache,
    formatting::escape_html,
    errors::Error,
    media::ImageResizer,
    messaging::port::MessagingPort,
    store::{load_or_default, Store},
    Result,
};

pub const DEFAULT_EMOJI_SIZE: u32 = 24;
/// Largest edge length, in pixels, a size token may request. Larger sizes
/// fall back to the default size.
pub const MAX_EMOJI_SIZE: u32 = 512;
const DELIMITER: char = ':';
/// File names containing this marker are derived outputs, not base assets.
const DERIVED_MARKER: &str = "_resized";

// ============== Emoji Index ==============

/// On-disk layout: `{"default_size": 24, "24": {"smile": "mxc://..."}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiIndexData {
    #[serde(default = "default_size", deserialize_with = "size_from_number_or_string")]
    pub default_size: u32,
    #[serde(flatten)]
    pub sizes: BTreeMap<String, BTreeMap<String, String>>,
}

impl Default for EmojiIndexData {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_EMOJI_SIZE,
            sizes: BTreeMap::new(),
        }
    }
}

fn default_size() -> u32 {
    DEFAULT_EMOJI_SIZE
}

// Older index files stored the default size as a string.
fn size_from_number_or_string<'de, D>(d: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u32),
        Str(String),
    }

    match Raw::deserialize(d)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// (size, name) → uploaded handle, plus the default size.
pub struct EmojiIndex {
    data: EmojiIndexData,
    store: Box<dyn Store<EmojiIndexData>>,
}

impl EmojiIndex {
    pub fn open(store: Box<dyn Store<EmojiIndexData>>) -> Self {
        let data = load_or_default(store.as_ref());
        Self { data, store }
    }

    pub fn default_size(&self) -> u32 {
        self.data.default_size
    }

    pub fn set_default_size(&mut self, size: u32) -> Result<()> {
        self.data.default_size = size;
        self.flush()
    }

    pub fn get(&self, size: u32, name: &str) -> Option<&str> {
        self.data
            .sizes
            .get(&size.to_string())
            .and_then(|bucket| bucket.get(name))
            .map(String::as_str)
    }

    pub fn put(&mut self, size: u32, name: &str, handle: String) {
        self.data
            .sizes
            .entry(size.to_string())
            .or_default()
            .insert(name.to_string(), handle);
    }

    pub fn flush(&self) -> Result<()> {
        self.store.save(&self.data)
    }
}

// ============== Asset Directory ==============

/// Base emoji images on disk, keyed by name (file name up to the first `.`).
#[derive(Clone, Debug)]
pub struct EmojiAssets {
    dir: PathBuf,
}

impl EmojiAssets {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Scan the directory. A missing directory means "no emoji".
    pub fn scan(&self) -> Result<BTreeMap<String, PathBuf>> {
        let rd = match fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(dir = %self.dir.display(), "emoji folder missing");
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut out = BTreeMap::new();
        for ent in rd.flatten() {
            let file_name = ent.file_name().to_string_lossy().to_string();
            if file_name.contains(DERIVED_MARKER) {
                continue;
            }
            if !ent.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = file_name.split('.').next().unwrap_or_default();
            if name.is_empty() {
                continue;
            }
            out.insert(name.to_string(), ent.path());
        }
        Ok(out)
    }
}

// ============== Expander ==============

pub struct EmojiExpander {
    assets: EmojiAssets,
    resizer: Arc<dyn ImageResizer>,
}

impl EmojiExpander {
    pub fn new(assets: EmojiAssets, resizer: Arc<dyn ImageResizer>) -> Self {
        Self { assets, resizer }
    }

    pub fn assets(&self) -> &EmojiAssets {
        &self.assets
    }

    /// Replace every `:name:` / `:name:SIZE:` token of a known emoji with an
    /// inline image. Unknown names are left alone.
    pub async fn expand(
        &self,
        body: &str,
        index: &mut EmojiIndex,
        cache: &mut ContentCache,
        uploader: &dyn MessagingPort,
    ) -> Result<String> {
        if body.matches(DELIMITER).count() < 2 {
            return Ok(body.to_string());
        }

        let assets = self.assets.scan()?;
        let mut out = body.to_string();

        for (name, path) in &assets {
            let token = format!("{DELIMITER}{name}{DELIMITER}");
            let mut from = 0usize;

            while let Some(rel) = out[from..].find(&token) {
                let start = from + rel;
                let after = start + token.len();

                let (size, consumed) = match explicit_size(&out[after..]) {
                    Some((size, len)) => (size, token.len() + len),
                    None => (index.default_size(), token.len()),
                };

                let handle = self.resolve(name, path, size, index, cache, uploader).await?;
                let tag = format!(
                    "<img src=\"{}\" alt=\"{}\">",
                    escape_html(&handle),
                    escape_html(name)
                );
                out.replace_range(start..start + consumed, &tag);
                from = start + tag.len();
            }
        }

        Ok(out)
    }

    async fn resolve(
        &self,
        name: &str,
        path: &Path,
        size: u32,
        index: &mut EmojiIndex,
        cache: &mut ContentCache,
        uploader: &dyn MessagingPort,
    ) -> Result<String> {
        if let Some(handle) = index.get(size, name) {
            return Ok(handle.to_string());
        }

        tracing::info!(emoji = name, size, "resizing and uploading emoji");
        let resizer = Arc::clone(&self.resizer);
        let source = path.to_path_buf();
        let png = tokio::task::spawn_blocking(move || resizer.resize_square(&source, size))
            .await
            .map_err(|e| Error::Image(format!("resize task failed: {e}")))??;
        let handle = cache
            .upload(uploader, png, &format!("{name}{DERIVED_MARKER}.png"))
            .await?;

        index.put(size, name, handle.clone());
        if let Err(e) = index.flush() {
            tracing::error!(error = %e, "failed to persist emoji index");
        }
        Ok(handle)
    }
}

/// Parse `SIZE:` at the start of `rest`. Returns the size and the number of
/// bytes it occupies including the closing delimiter.
fn explicit_size(rest: &str) -> Option<(u32, usize)> {
    let (digits, _) = rest.split_once(DELIMITER)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let size = digits
        .parse::<u32>()
        .ok()
        .filter(|s| (1..=MAX_EMOJI_SIZE).contains(s))?;
    Some((size, digits.len() + DELIMITER.len_utf8()))
}
