use thiserror::Error;
use url::Url;

/// Translation languages the app can ask the content source for.
const KNOWN_LANGUAGES: [&str; 3] = ["english", "arabic", "urdu"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppSettings {
    quran_api_base_url: Option<String>,
    preferred_language: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct AppSettingsDraft {
    pub quran_api_base_url: Option<String>,
    pub preferred_language: Option<String>,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppSettingsError {
    #[error("invalid content API base URL")]
    InvalidBaseUrl,
    #[error("unsupported language: {0:?}")]
    UnsupportedLanguage(String),
}

impl AppSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft into persisted settings.
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsError` if the base URL is present but invalid, or
    /// the language is not one the content source offers.
    pub fn validate(self) -> Result<AppSettings, AppSettingsError> {
        let quran_api_base_url = normalize_optional(self.quran_api_base_url);
        let preferred_language =
            normalize_optional(self.preferred_language).map(|lang| lang.to_lowercase());

        if let Some(url) = quran_api_base_url.as_ref() {
            if Url::parse(url).is_err() {
                return Err(AppSettingsError::InvalidBaseUrl);
            }
        }

        if let Some(lang) = preferred_language.as_ref() {
            if !KNOWN_LANGUAGES.contains(&lang.as_str()) {
                return Err(AppSettingsError::UnsupportedLanguage(lang.clone()));
            }
        }

        Ok(AppSettings {
            quran_api_base_url,
            preferred_language,
        })
    }
}

impl AppSettings {
    /// Rehydrate settings from persisted values.
    ///
    /// # Errors
    ///
    /// Returns `AppSettingsError` if any persisted value fails validation.
    pub fn from_persisted(
        quran_api_base_url: Option<String>,
        preferred_language: Option<String>,
    ) -> Result<Self, AppSettingsError> {
        AppSettingsDraft {
            quran_api_base_url,
            preferred_language,
        }
        .validate()
    }

    #[must_use]
    pub fn quran_api_base_url(&self) -> Option<&str> {
        self.quran_api_base_url.as_deref()
    }

    #[must_use]
    pub fn preferred_language(&self) -> Option<&str> {
        self.preferred_language.as_deref()
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            quran_api_base_url: None,
            preferred_language: None,
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
