//! In-memory fakes for the ports, shared by unit tests.

use std::{
    fs,
    path::Path,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    cache::CacheEntries,
    comics::{Comic, ComicSource},
    commands::{CommandContext, CommandHandler},
    config::test_settings,
    context::{BotContext, Collaborators},
    domain::{EventId, IncomingMessage, RoomId, RoomRef, UserId},
    emoji::{EmojiAssets, EmojiIndexData},
    errors::Error,
    media::ImageResizer,
    messaging::{port::MessagingPort, types::MessageContent},
    probe::HostProbe,
    store::{MemoryStore, Store},
    text_macros::TextReplacements,
    Result,
};

pub(crate) const OWN_USER: &str = "@me:example.org";
pub(crate) const OTHER_USER: &str = "@alice:example.org";
pub(crate) const ROOM: &str = "!room:example.org";

pub(crate) struct FakeMessenger {
    own: UserId,
    sent: Mutex<Vec<(RoomId, MessageContent)>>,
    uploads: Mutex<Vec<String>>,
    fail_uploads: AtomicBool,
}

impl FakeMessenger {
    pub(crate) fn new() -> Self {
        Self {
            own: UserId(OWN_USER.to_string()),
            sent: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            fail_uploads: AtomicBool::new(false),
        }
    }

    pub(crate) fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub(crate) fn uploaded_names(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub(crate) fn sent(&self) -> Vec<MessageContent> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Plain bodies of every text message sent so far.
    pub(crate) fn sent_bodies(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|c| match c {
                MessageContent::Text(t) => Some(t.body),
                MessageContent::Image(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    fn own_user_id(&self) -> &UserId {
        &self.own
    }

    async fn send(&self, room: &RoomId, content: MessageContent) -> Result<()> {
        self.sent.lock().unwrap().push((room.clone(), content));
        Ok(())
    }

    async fn upload(&self, _data: Vec<u8>, filename: &str) -> Result<String> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(Error::UploadFailed("homeserver unreachable".to_string()));
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(filename.to_string());
        Ok(format!("mxc://example.org/media{}", uploads.len()))
    }
}

/// Resizer that returns a deterministic fake PNG per (path, size) and
/// records the requested sizes.
#[derive(Default)]
pub(crate) struct FakeResizer {
    sizes: Mutex<Vec<u32>>,
}

impl FakeResizer {
    pub(crate) fn calls(&self) -> usize {
        self.sizes.lock().unwrap().len()
    }

    pub(crate) fn sizes(&self) -> Vec<u32> {
        self.sizes.lock().unwrap().clone()
    }
}

impl ImageResizer for FakeResizer {
    fn resize_square(&self, path: &Path, size: u32) -> Result<Vec<u8>> {
        self.sizes.lock().unwrap().push(size);
        Ok(format!("{}@{size}", path.display()).into_bytes())
    }
}

/// Store whose disk is gone: loads nothing and fails every save.
#[derive(Default)]
pub(crate) struct FailingStore {
    attempts: AtomicUsize,
}

impl FailingStore {
    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl<T> Store<T> for FailingStore {
    fn load(&self) -> Result<Option<T>> {
        Ok(None)
    }

    fn save(&self, _value: &T) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only file system",
        )))
    }
}

/// Serves one fixed comic, or fails every call when told to.
#[derive(Default)]
pub(crate) struct FakeComics {
    fail: AtomicBool,
    requested: Mutex<Vec<Option<u32>>>,
}

impl FakeComics {
    pub(crate) fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn requested(&self) -> Vec<Option<u32>> {
        self.requested.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::External("xkcd.com unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ComicSource for FakeComics {
    async fn fetch(&self, number: Option<u32>) -> Result<Comic> {
        self.requested.lock().unwrap().push(number);
        self.check()?;
        Ok(Comic {
            num: 149,
            year: "2009".to_string(),
            month: "8".to_string(),
            day: "7".to_string(),
            safe_title: "Sandwich".to_string(),
            alt: "Make me a sandwich.".to_string(),
            img: "https://imgs.xkcd.com/comics/sandwich.png".to_string(),
        })
    }

    async fn image(&self, comic: &Comic) -> Result<(Vec<u8>, String)> {
        self.check()?;
        Ok((format!("comic {}", comic.num).into_bytes(), comic.file_name()))
    }
}

/// Records probed hosts; every host answers.
#[derive(Default)]
pub(crate) struct FakeProbe {
    hosts: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub(crate) fn hosts(&self) -> Vec<String> {
        self.hosts.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostProbe for FakeProbe {
    async fn ping(&self, host: &str) -> bool {
        self.hosts.lock().unwrap().push(host.to_string());
        true
    }
}

/// A fully wired bot over fakes, with handles on every fake.
pub(crate) struct TestBot {
    pub(crate) bot: Arc<BotContext>,
    pub(crate) api: Arc<FakeMessenger>,
    pub(crate) resizer: Arc<FakeResizer>,
    pub(crate) emoji_store: Arc<MemoryStore<EmojiIndexData>>,
    pub(crate) cache_store: Arc<MemoryStore<CacheEntries>>,
    pub(crate) comics: Arc<FakeComics>,
    pub(crate) probe: Arc<FakeProbe>,
    _dir: tempfile::TempDir,
}

/// Bot with `emoji_files` present in its asset folder and the text macro
/// `;wave;` -> `o/`.
pub(crate) fn test_bot(emoji_files: &[&str]) -> TestBot {
    let dir = tempfile::tempdir().unwrap();
    for name in emoji_files {
        fs::write(dir.path().join(name), b"img").unwrap();
    }

    let api = Arc::new(FakeMessenger::new());
    let resizer = Arc::new(FakeResizer::default());
    let emoji_store = Arc::new(MemoryStore::<EmojiIndexData>::new());
    let cache_store = Arc::new(MemoryStore::<CacheEntries>::new());
    let comics = Arc::new(FakeComics::default());
    let probe = Arc::new(FakeProbe::default());

    let parts = Collaborators {
        cache_store: Box::new(cache_store.clone()),
        emoji_store: Box::new(emoji_store.clone()),
        text: TextReplacements::new(
            [("wave".to_string(), "o/".to_string())].into_iter().collect(),
        ),
        assets: EmojiAssets::new(dir.path()),
        resizer: resizer.clone(),
        comics: comics.clone(),
        probe: probe.clone(),
    };
    let bot = BotContext::new(Arc::new(test_settings()), api.clone(), parts);

    TestBot {
        bot: Arc::new(bot),
        api,
        resizer,
        emoji_store,
        cache_store,
        comics,
        probe,
        _dir: dir,
    }
}

pub(crate) fn message(sender: &str, body: &str) -> IncomingMessage {
    IncomingMessage {
        room: RoomRef {
            id: RoomId(ROOM.to_string()),
            display_name: "Test Room".to_string(),
        },
        event_id: EventId("$event1".to_string()),
        sender: UserId(sender.to_string()),
        body: body.to_string(),
        is_edit: false,
    }
}

async fn run_handler(
    t: &TestBot,
    handler: &dyn CommandHandler,
    msg: &IncomingMessage,
    args: &[String],
) -> Result<()> {
    let ctx = CommandContext {
        args,
        room: &msg.room,
        message: msg,
    };
    handler.run(&t.bot, &ctx).await
}

/// Run `handler` for the bot's own account with `args`.
pub(crate) async fn run_command(
    t: &TestBot,
    handler: &dyn CommandHandler,
    args: &[&str],
) -> Result<()> {
    run_command_as(t, handler, OWN_USER, args).await
}

pub(crate) async fn run_command_as(
    t: &TestBot,
    handler: &dyn CommandHandler,
    sender: &str,
    args: &[&str],
) -> Result<()> {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    let body = std::iter::once("!cmd".to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");
    run_handler(t, handler, &message(sender, &body), &args).await
}

/// Run `handler` for the bot's own account on a message with `body`; the
/// arguments are the words after the command token.
pub(crate) async fn run_command_with_body(
    t: &TestBot,
    handler: &dyn CommandHandler,
    body: &str,
) -> Result<()> {
    let args: Vec<String> = body.split_whitespace().skip(1).map(str::to_string).collect();
    run_handler(t, handler, &message(OWN_USER, body), &args).await
}
