#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use feedpost_core::{ArticleContent, DeviceIdentity, FeedEntry, SessionBlob};
use feedpost_engine::{
    ContentSource, PlatformClient, PlatformError, SourceError, StateStore, StorePaths,
};
use serde_json::json;
use tempfile::TempDir;

pub const GOOD_COOKIE: &str = "good-cookie";

pub fn store_in(dir: &TempDir) -> StateStore {
    StateStore::new(StorePaths::in_dir(dir.path()))
}

pub fn live_session(tag: &str) -> SessionBlob {
    SessionBlob::new(json!({ "tag": tag, "live": true }))
}

pub fn stale_session() -> SessionBlob {
    SessionBlob::new(json!({ "tag": "stale", "live": false }))
}

/// Accepts sessions marked `live`; login and upload replay scripted results
/// and succeed once the script runs out.
#[derive(Default)]
pub struct FakePlatform {
    pub login_calls: AtomicUsize,
    pub probe_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    login_script: Mutex<VecDeque<Result<SessionBlob, PlatformError>>>,
    upload_script: Mutex<VecDeque<Result<SessionBlob, PlatformError>>>,
    captions: Mutex<Vec<String>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_login(&self, result: Result<SessionBlob, PlatformError>) {
        self.login_script.lock().unwrap().push_back(result);
    }

    pub fn script_upload(&self, result: Result<SessionBlob, PlatformError>) {
        self.upload_script.lock().unwrap().push_back(result);
    }

    pub fn logins(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn captions(&self) -> Vec<String> {
        self.captions.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PlatformClient for FakePlatform {
    async fn login(
        &self,
        username: &str,
        _password: &str,
        _device: &DeviceIdentity,
    ) -> Result<SessionBlob, PlatformError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.login_script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(live_session(username)))
    }

    fn session_from_cookie(&self, cookie: &str, _device: &DeviceIdentity) -> SessionBlob {
        SessionBlob::new(json!({ "tag": "cookie", "live": cookie == GOOD_COOKIE }))
    }

    async fn probe(&self, session: &SessionBlob) -> Result<(), PlatformError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        if session.as_value()["live"] == json!(true) {
            Ok(())
        } else {
            Err(PlatformError::new(
                feedpost_engine::PlatformFailure::LoginRequired,
                "session expired",
            ))
        }
    }

    async fn upload_photo(
        &self,
        session: &SessionBlob,
        media: &Path,
        caption: &str,
    ) -> Result<SessionBlob, PlatformError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        assert!(media.exists(), "upload called without a downloaded image");
        self.captions.lock().unwrap().push(caption.to_string());
        let scripted = self.upload_script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(session.clone()))
    }
}

/// Serves one fixed entry and article; downloads write a stub image.
#[derive(Default)]
pub struct FakeSource {
    pub entry: Mutex<Option<FeedEntry>>,
    pub article: Mutex<ArticleContent>,
    pub feed_calls: AtomicUsize,
    pub article_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_entry(entry: FeedEntry, article: ArticleContent) -> Self {
        Self {
            entry: Mutex::new(Some(entry)),
            article: Mutex::new(article),
            ..Self::default()
        }
    }

    pub fn fetches(&self) -> usize {
        self.article_calls.load(Ordering::SeqCst) + self.download_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ContentSource for FakeSource {
    async fn latest_entry(&self, _feed_url: &str) -> Result<Option<FeedEntry>, SourceError> {
        self.feed_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entry.lock().unwrap().clone())
    }

    async fn article(&self, _url: &str) -> ArticleContent {
        self.article_calls.fetch_add(1, Ordering::SeqCst);
        self.article.lock().unwrap().clone()
    }

    async fn download_image(&self, _url: &str, dest: &Path) -> Result<(), SourceError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        feedpost_engine::write_atomic(dest, b"\xFF\xD8\xFF\xE0jpeg")?;
        Ok(())
    }
}

pub fn sample_entry() -> FeedEntry {
    FeedEntry {
        id: "https://news.example/storm".to_string(),
        title: "Storm hits region".to_string(),
        summary: "<p>Heavy rain in the valley.</p>".to_string(),
    }
}

pub fn sample_article() -> ArticleContent {
    ArticleContent {
        image_url: Some("https://news.example/storm.jpg".to_string()),
        body: "Heavy rain fell across the valley overnight.".to_string(),
    }
}
