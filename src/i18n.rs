//! Message template catalog: per-locale key→template maps with fallback.
//!
//! Templates live in a directory of `<locale>.json` files (nested objects;
//! dot-separated keys address the nesting). The catalog is loaded once at
//! startup, is immutable afterwards, and is shared across all dispatches via
//! `Arc`. Rendering must never block a delivery: every failure mode degrades
//! to returning the raw template or the literal key instead of erroring.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::locale::Locale;

/// Immutable per-locale template store.
///
/// Lookup order is locale map → default-locale (`en`) map → the literal key.
#[derive(Debug, Default)]
pub struct MessageCatalog {
    maps: HashMap<Locale, Value>,
}

impl MessageCatalog {
    /// Creates an empty catalog; every lookup falls through to the key.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads every `<locale>.json` file under `dir`.
    ///
    /// A missing directory yields an empty catalog; an unreadable or
    /// malformed file is skipped with a warning. Neither is fatal — worst
    /// case the service renders raw keys, which is observable but harmless.
    #[must_use]
    pub fn load_dir(dir: &Path) -> Self {
        let mut maps = HashMap::new();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(error) => {
                tracing::warn!(dir = %dir.display(), %error, "i18n directory unavailable");
                return Self { maps };
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let locale = Locale::normalize(Some(stem));
            match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|e| e.to_string()))
            {
                Ok(value) => {
                    maps.insert(locale, value);
                }
                Err(error) => {
                    tracing::warn!(file = %path.display(), error, "skipping bad locale file");
                }
            }
        }
        tracing::info!(locales = maps.len(), "message catalog loaded");
        Self { maps }
    }

    /// Builds a catalog directly from parsed locale maps (used in tests).
    #[must_use]
    pub fn from_maps(maps: HashMap<Locale, Value>) -> Self {
        Self { maps }
    }

    fn get(&self, locale: Locale, key: &str) -> Option<&str> {
        let mut cursor = self.maps.get(&locale)?;
        for part in key.split('.') {
            cursor = cursor.as_object()?.get(part)?;
        }
        cursor.as_str()
    }

    /// Resolves `key` for `locale`, falling back to the default locale and
    /// finally to the key itself. Never fails.
    #[must_use]
    pub fn lookup<'a>(&'a self, key: &'a str, locale: Locale) -> &'a str {
        self.get(locale, key)
            .or_else(|| self.get(Locale::En, key))
            .unwrap_or(key)
    }

    /// Renders `key` for `locale`, substituting `{name}` placeholders.
    ///
    /// If any placeholder in the template has no matching variable, the raw
    /// template is returned unsubstituted — a degraded message is preferable
    /// to a failed delivery.
    #[must_use]
    pub fn render(&self, key: &str, locale: Locale, vars: &[(&str, String)]) -> String {
        let template = self.lookup(key, locale);
        match substitute(template, vars) {
            Some(rendered) => rendered,
            None => template.to_string(),
        }
    }
}

/// Substitutes `{name}` placeholders; `None` when a placeholder is unknown
/// or the braces are unbalanced. Literal `{{`/`}}` escape to single braces.
fn substitute(template: &str, vars: &[(&str, String)]) -> Option<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(inner) => name.push(inner),
                        None => return None,
                    }
                }
                let value = vars.iter().find(|(k, _)| *k == name)?;
                out.push_str(&value.1);
            }
            '}' => return None,
            other => out.push(other),
        }
    }
    Some(out)
}
