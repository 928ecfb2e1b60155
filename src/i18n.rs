//! Localization bundles
//!
//! A bundle is a flat JSON object of dotted keys to strings. Bundles are read
//! from the configured locales directory when there is one, otherwise from the
//! copies compiled into the binary.

use anyhow::{Context, Result, anyhow};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, error, warn};

use crate::constants::i18n::DEFAULT_LANGUAGE;
use crate::persistence::KeyValueStore;
use crate::store::AppStore;

/// Supported language codes and their display names
pub const LANGUAGES: [(&str, &str); 8] = [
    ("en", "English"),
    ("ru", "Русский"),
    ("sg", "Singapore"),
    ("id", "Bahasa Indonesia"),
    ("zh", "中文"),
    ("th", "ไทย"),
    ("ph", "Filipino"),
    ("ko", "한국어"),
];

const EMBEDDED: [(&str, &str); 2] = [
    ("en", include_str!("../locales/en.json")),
    ("id", include_str!("../locales/id.json")),
];

pub fn is_supported(code: &str) -> bool {
    LANGUAGES.iter().any(|(c, _)| *c == code)
}

pub fn display_name(code: &str) -> &str {
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

#[derive(Debug, Clone)]
pub struct Translator {
    language: String,
    entries: HashMap<String, String>,
}

fn read_bundle(code: &str, locales_dir: Option<&Path>) -> Result<HashMap<String, String>> {
    if !is_supported(code) {
        return Err(anyhow!("Unsupported language '{code}'"));
    }

    let raw = match locales_dir {
        Some(dir) => {
            let path = dir.join(format!("{code}.json"));
            fs::read_to_string(&path)
                .with_context(|| format!("Failed to read locale bundle {}", path.display()))?
        }
        None => EMBEDDED
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, raw)| raw.to_string())
            .ok_or_else(|| anyhow!("No built-in bundle for '{code}'"))?,
    };

    serde_json::from_str(&raw).with_context(|| format!("Failed to parse locale bundle '{code}'"))
}

impl Translator {
    /// Load `code`, falling back to the default language and then to an empty table
    pub fn load(code: &str, locales_dir: Option<&Path>) -> Self {
        // The directory may only carry some bundles; the built-in default always exists
        let attempts = [(code, locales_dir), (DEFAULT_LANGUAGE, locales_dir), (DEFAULT_LANGUAGE, None)];

        for (language, dir) in attempts {
            match read_bundle(language, dir) {
                Ok(entries) => {
                    debug!(language = %language, keys = entries.len(), "Locale bundle loaded");
                    return Self {
                        language: language.to_string(),
                        entries,
                    };
                }
                Err(e) => warn!(language = %language, error = %e, "Locale bundle unavailable"),
            }
        }

        error!("No locale bundle could be loaded, showing raw keys");
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            entries: HashMap::new(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Look up `key`; a missing key yields the key itself
    ///
    /// Each `(name, value)` replaces the first `{name}` in the text.
    pub fn translate(&self, key: &str, replacements: &[(&str, &str)]) -> String {
        let mut text = self
            .entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string());
        for (name, value) in replacements {
            text = text.replacen(&format!("{{{name}}}"), value, 1);
        }
        text
    }

    /// Shorthand for `translate` without replacements
    pub fn t(&self, key: &str) -> String {
        self.translate(key, &[])
    }
}

/// Load the store's language and persist the one that actually loaded
pub fn load_for_store<B: KeyValueStore>(store: &mut AppStore<B>, locales_dir: Option<&Path>) -> Translator {
    let requested = store.language().to_string();
    let translator = Translator::load(&requested, locales_dir);
    if translator.language() != requested {
        warn!(requested = %requested, loaded = %translator.language(), "Storing fallback language");
        if let Err(e) = store.set_language(translator.language()) {
            error!(error = %e, "Failed to store fallback language");
        }
    }
    translator
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_entries(pairs: &[(&str, &str)]) -> Translator {
        Translator {
            language: "en".to_string(),
            entries: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_missing_key_returns_key() {
        let t = from_entries(&[]);
        assert_eq!(t.t("preview.title"), "preview.title");
    }

    #[test]
    fn test_placeholder_replaced_once() {
        let t = from_entries(&[("greet", "Hi {name}, {name}!")]);
        assert_eq!(t.translate("greet", &[("name", "Ada")]), "Hi Ada, {name}!");
    }

    #[test]
    fn test_embedded_bundles_parse() {
        for (code, _) in EMBEDDED {
            let t = Translator::load(code, None);
            assert_eq!(t.language(), code);
            assert_ne!(t.t("header.title"), "header.title");
        }
    }

    #[test]
    fn test_unbundled_language_falls_back_to_default() {
        let t = Translator::load("ko", None);
        assert_eq!(t.language(), DEFAULT_LANGUAGE);
        assert_ne!(t.t("header.title"), "header.title");
    }

    #[test]
    fn test_locales_dir_overrides_embedded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("th.json"), r#"{"header.title":"สตูดิโอ"}"#).unwrap();
        let t = Translator::load("th", Some(dir.path()));
        assert_eq!(t.language(), "th");
        assert_eq!(t.t("header.title"), "สตูดิโอ");
    }

    #[test]
    fn test_broken_bundle_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ru.json"), "{oops").unwrap();
        let t = Translator::load("ru", Some(dir.path()));
        assert_eq!(t.language(), DEFAULT_LANGUAGE);
        assert_ne!(t.t("header.title"), "header.title");
    }

    #[test]
    fn test_store_follows_fallback_language() {
        let mut store = AppStore::open(crate::persistence::MemoryStore::new());
        store.set_language("ko").unwrap();
        let t = load_for_store(&mut store, None);
        assert_eq!(t.language(), DEFAULT_LANGUAGE);
        assert_eq!(store.language(), DEFAULT_LANGUAGE);

        store.set_language("en").unwrap();
        let t = load_for_store(&mut store, None);
        assert_eq!(t.language(), "en");
        assert_eq!(store.language(), "en");
    }

    #[test]
    fn test_supported_codes() {
        assert!(is_supported("zh"));
        assert!(!is_supported("de"));
        assert_eq!(display_name("id"), "Bahasa Indonesia");
    }
}
