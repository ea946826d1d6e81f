use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use quest_core::model::{AppSettings, Verse, VerseKey};

use crate::error::ContentError;

/// Default base of the public verse API.
pub const DEFAULT_QURAN_API_BASE_URL: &str = "https://quranapi.pages.dev/api";

//
// ─── VERSE SOURCE ──────────────────────────────────────────────────────────────
//

/// Abstract verse content source.
///
/// `Ok(None)` means the verse does not exist (e.g. an ayah past the end of
/// its surah); that drives the resolver's rollover rule. `Err` is a
/// transient failure and drives placeholder degradation instead.
#[async_trait]
pub trait VerseSource: Send + Sync {
    /// Fetch a single verse.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` only for transient failures; an absent verse
    /// is `Ok(None)`.
    async fn fetch_verse(&self, key: VerseKey) -> Result<Option<Verse>, ContentError>;
}

//
// ─── HTTP CLIENT ───────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct QuranApiConfig {
    pub base_url: String,
}

impl QuranApiConfig {
    /// Resolve the base URL from settings, then the environment, then the
    /// built-in default.
    #[must_use]
    pub fn resolve(settings: &AppSettings) -> Self {
        let base_url = settings
            .quran_api_base_url()
            .map(ToString::to_string)
            .or_else(|| env::var("QUEST_QURAN_API_URL").ok())
            .unwrap_or_else(|| DEFAULT_QURAN_API_BASE_URL.to_string());
        Self { base_url }
    }
}

impl Default for QuranApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_QURAN_API_BASE_URL.to_string(),
        }
    }
}

/// HTTP client for the verse API, one JSON document per ayah.
#[derive(Clone)]
pub struct QuranApiClient {
    client: Client,
    base_url: String,
}

impl QuranApiClient {
    #[must_use]
    pub fn new(config: QuranApiConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url,
        }
    }

    fn verse_url(&self, key: VerseKey) -> String {
        format!(
            "{}/{}/{}.json",
            self.base_url.trim_end_matches('/'),
            key.surah(),
            key.ayah()
        )
    }
}

/// Wire shape of a single-ayah document.
#[derive(Debug, Deserialize)]
struct VersePayload {
    arabic1: String,
    english: String,
}

#[async_trait]
impl VerseSource for QuranApiClient {
    async fn fetch_verse(&self, key: VerseKey) -> Result<Option<Verse>, ContentError> {
        let response = self.client.get(self.verse_url(key)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ContentError::Status(response.status()));
        }

        let payload: VersePayload = response
            .json()
            .await
            .map_err(|e| ContentError::Malformed(e.to_string()))?;

        Ok(Some(Verse::new(key, payload.arabic1, payload.english)))
    }
}

//
// ─── STATIC SOURCE ─────────────────────────────────────────────────────────────
//

/// In-memory verse source for tests and prototyping.
///
/// Holds a fixed verse map; keys listed as failing return an error on every
/// fetch, which exercises the placeholder path.
#[derive(Clone, Default)]
pub struct StaticVerseSource {
    verses: Arc<Mutex<HashMap<VerseKey, Verse>>>,
    failing: Arc<Mutex<Vec<VerseKey>>>,
}

impl StaticVerseSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate one surah with `count` generated verses.
    ///
    /// # Panics
    ///
    /// Panics if `surah` is out of range, so tests fail loudly on typos.
    pub fn with_surah(self, surah: u16, count: u16) -> Self {
        {
            let mut verses = self.verses.lock().expect("source poisoned");
            for ayah in 1..=count {
                let key = VerseKey::new(surah, ayah).expect("valid test key");
                verses.insert(
                    key,
                    Verse::new(key, format!("آية {surah}:{ayah}"), format!("Verse {surah}:{ayah}")),
                );
            }
        }
        self
    }

    /// Mark a key as failing with a transient error.
    ///
    /// # Panics
    ///
    /// Panics if the source mutex is poisoned, so tests fail loudly.
    pub fn fail_at(self, key: VerseKey) -> Self {
        self.failing.lock().expect("source poisoned").push(key);
        self
    }
}

#[async_trait]
impl VerseSource for StaticVerseSource {
    async fn fetch_verse(&self, key: VerseKey) -> Result<Option<Verse>, ContentError> {
        let failing = self
            .failing
            .lock()
            .map_err(|e| ContentError::Malformed(e.to_string()))?;
        if failing.contains(&key) {
            return Err(ContentError::Malformed("scripted failure".to_string()));
        }
        drop(failing);

        let verses = self
            .verses
            .lock()
            .map_err(|e| ContentError::Malformed(e.to_string()))?;
        Ok(verses.get(&key).cloned())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
