use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{errors::Error, Result};

pub const XKCD_BASE_URL: &str = "https://xkcd.com";

/// Subset of the xkcd `info.0.json` document.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Comic {
    pub num: u32,
    pub year: String,
    pub month: String,
    pub day: String,
    pub safe_title: String,
    pub alt: String,
    pub img: String,
}

impl Comic {
    /// Local file name for the comic image: `<num>.<ext>`.
    pub fn file_name(&self) -> String {
        let ext = self
            .img
            .rsplit('/')
            .next()
            .and_then(|last| last.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .unwrap_or("png");
        format!("{}.{ext}", self.num)
    }
}

#[async_trait]
pub trait ComicSource: Send + Sync {
    /// Fetch comic metadata; `None` means the latest comic.
    async fn fetch(&self, number: Option<u32>) -> Result<Comic>;

    /// Image bytes and file name for `comic`.
    async fn image(&self, comic: &Comic) -> Result<(Vec<u8>, String)>;
}

/// xkcd JSON API client with an on-disk image cache.
pub struct XkcdClient {
    http: reqwest::Client,
    base_url: String,
    cache_dir: PathBuf,
}

impl XkcdClient {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self::with_base_url(XKCD_BASE_URL, cache_dir)
    }

    pub fn with_base_url(base_url: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache_dir: cache_dir.into(),
        }
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(Error::External(format!(
                "GET {url} returned {}",
                resp.status()
            )));
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ComicSource for XkcdClient {
    async fn fetch(&self, number: Option<u32>) -> Result<Comic> {
        let url = match number {
            Some(n) => format!("{}/{n}/info.0.json", self.base_url),
            None => format!("{}/info.0.json", self.base_url),
        };
        let body = self.get_bytes(&url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn image(&self, comic: &Comic) -> Result<(Vec<u8>, String)> {
        let file_name = comic.file_name();
        let path = self.cache_dir.join(&file_name);

        if let Ok(bytes) = tokio::fs::read(&path).await {
            return Ok((bytes, file_name));
        }

        let bytes = self.get_bytes(&comic.img).await?;
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        tokio::fs::write(&path, &bytes).await?;
        Ok((bytes, file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info_json(server_url: &str, num: u32) -> String {
        serde_json::json!({
            "num": num,
            "year": "2009",
            "month": "8",
            "day": "7",
            "safe_title": "Sandwich",
            "title": "Sandwich",
            "alt": "Proper User Policy apparently means Simon Says.",
            "img": format!("{server_url}/comics/sandwich.png"),
        })
        .to_string()
    }

    #[tokio::test]
    async fn fetches_numbered_comic_and_caches_image() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();
        let info = server
            .mock("GET", "/149/info.0.json")
            .with_header("content-type", "application/json")
            .with_body(info_json(&url, 149))
            .create_async()
            .await;
        let img = server
            .mock("GET", "/comics/sandwich.png")
            .with_body(b"png".as_slice())
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = XkcdClient::with_base_url(&url, dir.path());

        let comic = client.fetch(Some(149)).await.unwrap();
        assert_eq!(comic.num, 149);
        assert_eq!(comic.safe_title, "Sandwich");

        let (bytes, name) = client.image(&comic).await.unwrap();
        assert_eq!(bytes, b"png");
        assert_eq!(name, "149.png");
        // Second call is served from disk.
        client.image(&comic).await.unwrap();

        info.assert_async().await;
        img.assert_async().await;
        assert!(dir.path().join("149.png").is_file());
    }

    #[tokio::test]
    async fn latest_comic_uses_root_document() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();
        let _m = server
            .mock("GET", "/info.0.json")
            .with_body(info_json(&url, 3000))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let comic = XkcdClient::with_base_url(&url, dir.path())
            .fetch(None)
            .await
            .unwrap();
        assert_eq!(comic.num, 3000);
    }

    #[tokio::test]
    async fn http_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/404/info.0.json")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = XkcdClient::with_base_url(server.url(), dir.path())
            .fetch(Some(404))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::External(_)));
    }

    #[test]
    fn file_name_uses_image_extension() {
        let c = Comic {
            num: 1,
            year: String::new(),
            month: String::new(),
            day: String::new(),
            safe_title: String::new(),
            alt: String::new(),
            img: "https://imgs.xkcd.com/comics/barrel_cropped_(1).jpg".to_string(),
        };
        assert_eq!(c.file_name(), "1.jpg");
    }
}
