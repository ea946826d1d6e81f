use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of surahs in the Quran.
pub const SURAH_COUNT: u16 = 114;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerseKeyError {
    #[error("surah number must be in 1..=114, got {0}")]
    SurahOutOfRange(u16),
    #[error("ayah number must be at least 1, got {0}")]
    AyahOutOfRange(u16),
    #[error("expected \"surah:ayah\", got {0:?}")]
    Malformed(String),
}

//
// ─── VERSE KEY ─────────────────────────────────────────────────────────────────
//

/// Position of a single ayah within the Quran.
///
/// Ordering follows reading order: first by surah, then by ayah. The upper
/// bound of an ayah within its surah is not validated here; the content
/// source is the authority on which verses exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerseKey {
    surah: u16,
    ayah: u16,
}

impl VerseKey {
    /// Creates a validated verse key.
    ///
    /// # Errors
    ///
    /// Returns `VerseKeyError` if the surah is outside `1..=114` or the ayah
    /// is zero.
    pub fn new(surah: u16, ayah: u16) -> Result<Self, VerseKeyError> {
        if surah == 0 || surah > SURAH_COUNT {
            return Err(VerseKeyError::SurahOutOfRange(surah));
        }
        if ayah == 0 {
            return Err(VerseKeyError::AyahOutOfRange(ayah));
        }
        Ok(Self { surah, ayah })
    }

    /// The very first verse of the Quran, where every new reader starts.
    #[must_use]
    pub fn first() -> Self {
        Self { surah: 1, ayah: 1 }
    }

    #[must_use]
    pub fn surah(&self) -> u16 {
        self.surah
    }

    #[must_use]
    pub fn ayah(&self) -> u16 {
        self.ayah
    }

    /// The next position within the same surah.
    ///
    /// The result may name an ayah past the end of the surah; callers resolve
    /// that against the content source via the rollover rule.
    #[must_use]
    pub fn next_in_surah(&self) -> Self {
        Self {
            surah: self.surah,
            ayah: self.ayah.saturating_add(1),
        }
    }

    /// The first ayah of the following surah, or `None` past surah 114.
    #[must_use]
    pub fn start_of_next_surah(&self) -> Option<Self> {
        if self.surah >= SURAH_COUNT {
            return None;
        }
        Some(Self {
            surah: self.surah + 1,
            ayah: 1,
        })
    }
}

impl fmt::Display for VerseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.surah, self.ayah)
    }
}

impl FromStr for VerseKey {
    type Err = VerseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (surah, ayah) = s
            .split_once(':')
            .ok_or_else(|| VerseKeyError::Malformed(s.to_string()))?;
        let surah: u16 = surah
            .trim()
            .parse()
            .map_err(|_| VerseKeyError::Malformed(s.to_string()))?;
        let ayah: u16 = ayah
            .trim()
            .parse()
            .map_err(|_| VerseKeyError::Malformed(s.to_string()))?;
        Self::new(surah, ayah)
    }
}

//
// ─── VERSE ─────────────────────────────────────────────────────────────────────
//

/// A single ayah with its Arabic text and translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub key: VerseKey,
    pub arabic: String,
    pub translation: String,
}

/// Arabic text of the opening verse, used as fallback content.
const PLACEHOLDER_ARABIC: &str = "بِسْمِ اللَّهِ الرَّحْمَٰنِ الرَّحِيمِ";
const PLACEHOLDER_TRANSLATION: &str =
    "In the name of Allah, the Entirely Merciful, the Especially Merciful.";

impl Verse {
    #[must_use]
    pub fn new(key: VerseKey, arabic: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            key,
            arabic: arabic.into(),
            translation: translation.into(),
        }
    }

    /// Fallback verse shown when a single content lookup fails.
    ///
    /// Carries the text of surah 1, ayah 1 under the position that failed, so
    /// cursor arithmetic over the window stays intact while the lesson itself
    /// never aborts.
    #[must_use]
    pub fn placeholder_at(key: VerseKey) -> Self {
        Self {
            key,
            arabic: PLACEHOLDER_ARABIC.to_string(),
            translation: PLACEHOLDER_TRANSLATION.to_string(),
        }
    }

    /// Returns true if this verse carries the fallback text.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.arabic == PLACEHOLDER_ARABIC && self.key != VerseKey::first()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
