//! Random verse lookup against the public verse dataset.
//!
//! A lookup picks a random book and chapter, fetches that chapter's JSON and
//! picks a random verse from it. Any failure falls back to a random curated
//! verse, so callers always get something to show.

use std::sync::{Arc, Mutex, PoisonError};

use card_core::{popular_verses, Verse, VerseOrigin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics;

/// Books eligible for random lookup with their chapter counts.
pub const BOOKS: &[(&str, u32)] = &[
    ("psalms", 150),
    ("proverbs", 31),
    ("john", 21),
    ("romans", 16),
    ("matthew", 28),
    ("philippians", 4),
    ("ephesians", 6),
    ("james", 5),
    ("1peter", 5),
];

/// Notice shown when a remote verse was found.
pub const REMOTE_NOTICE: &str = "Random verse loaded!";

/// Notice shown when the lookup fell back to a curated verse.
pub const FALLBACK_NOTICE: &str = "Couldn't fetch random verse, using a popular one instead";

/// Why a remote lookup failed. Only ever logged; callers see the fallback.
#[derive(Debug, Error)]
pub enum VerseError {
    /// Request failed in transit.
    #[error("verse request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Dataset answered with a non-success status.
    #[error("verse dataset returned status {0}")]
    Status(u16),
    /// Chapter payload had no verses.
    #[error("chapter {book} {chapter} has no verses")]
    Empty {
        /// Book slug requested.
        book: &'static str,
        /// Chapter requested.
        chapter: u32,
    },
}

/// Result of a random lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerseLookup {
    /// The verse to display.
    pub verse: Verse,
    /// `remote` or `fallback`.
    pub origin: VerseOrigin,
}

impl VerseLookup {
    /// User-facing notice for this outcome.
    #[must_use]
    pub fn notice(&self) -> &'static str {
        match self.origin {
            VerseOrigin::Fallback => FALLBACK_NOTICE,
            _ => REMOTE_NOTICE,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChapterPayload {
    #[serde(default)]
    verses: Vec<VerseEntry>,
}

#[derive(Debug, Deserialize)]
struct VerseEntry {
    book: String,
    chapter: NumberOrString,
    verse: NumberOrString,
    text: String,
}

/// The dataset is inconsistent about quoting numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

impl std::fmt::Display for NumberOrString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// Client for the verse dataset.
#[derive(Debug, Clone)]
pub struct VerseClient {
    http: Client,
    base_url: String,
    version: String,
    rng: Arc<Mutex<StdRng>>,
}

impl VerseClient {
    /// Create a client seeded from the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, version: &str) -> Result<Self, VerseError> {
        Self::with_rng(base_url, version, StdRng::from_os_rng())
    }

    /// Create a client with a fixed seed, for reproducible picks.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_seed(base_url: &str, version: &str, seed: u64) -> Result<Self, VerseError> {
        Self::with_rng(base_url, version, StdRng::seed_from_u64(seed))
    }

    fn with_rng(base_url: &str, version: &str, rng: StdRng) -> Result<Self, VerseError> {
        let http = Client::builder()
            .user_agent(concat!("versecard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            version: version.to_string(),
            rng: Arc::new(Mutex::new(rng)),
        })
    }

    /// URL of one chapter's JSON.
    #[must_use]
    pub fn chapter_url(&self, book: &str, chapter: u32) -> String {
        format!(
            "{}/{}/books/{book}/chapters/{chapter}.json",
            self.base_url, self.version
        )
    }

    /// Pick a random verse, falling back to a curated one on any failure.
    #[tracing::instrument(name = "random_verse", skip(self))]
    pub async fn random_verse(&self) -> VerseLookup {
        let lookup = match self.fetch_random().await {
            Ok(verse) => VerseLookup {
                verse,
                origin: VerseOrigin::Remote,
            },
            Err(err) => {
                tracing::warn!(error = %err, "verse lookup failed, using curated verse");
                VerseLookup {
                    verse: self.random_popular(),
                    origin: VerseOrigin::Fallback,
                }
            }
        };
        metrics::record_verse_lookup(lookup.origin);
        lookup
    }

    async fn fetch_random(&self) -> Result<Verse, VerseError> {
        let (book, chapter) = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            let (book, chapters) = BOOKS[rng.random_range(0..BOOKS.len())];
            (book, rng.random_range(1..=chapters))
        };

        let url = self.chapter_url(book, chapter);
        tracing::debug!(url = %url, "fetching chapter");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(VerseError::Status(status.as_u16()));
        }

        let mut payload: ChapterPayload = response.json().await?;
        if payload.verses.is_empty() {
            return Err(VerseError::Empty { book, chapter });
        }

        let index = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rng.random_range(0..payload.verses.len())
        };
        let entry = payload.verses.swap_remove(index);

        Ok(Verse::new(
            entry.text.trim(),
            format!("{} {}:{}", entry.book, entry.chapter, entry.verse),
        ))
    }

    fn random_popular(&self) -> Verse {
        let mut verses = popular_verses();
        let index = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rng.random_range(0..verses.len())
        };
        verses.swap_remove(index)
    }
}
