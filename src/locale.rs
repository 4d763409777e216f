//! Canonical locale set and normalization of external language tags.
//!
//! External systems attach free-form language tags to destination channels
//! (`"zh_CN"`, `"zh-Hant"`, `"EN"`, …). Rendering only supports a small
//! canonical set, so every tag is normalized into it before template
//! selection. Normalization is a pure total function: any input, including
//! garbage, maps to a canonical locale.

use std::fmt;

/// Canonical locales supported by the message catalog.
///
/// All external tags normalize into this set; [`Locale::En`] is the default
/// and the fallback for unrecognized tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    /// English (default).
    #[default]
    En,
    /// Simplified Chinese.
    ZhCn,
    /// Traditional Chinese.
    ZhTw,
}

impl Locale {
    /// Normalizes an arbitrary external language tag into the canonical set.
    ///
    /// Matching is case-insensitive after trimming; underscores and spaces
    /// are treated as hyphens. `None`, empty, and unrecognized tags all map
    /// to [`Locale::En`].
    #[must_use]
    pub fn normalize(tag: Option<&str>) -> Self {
        let Some(raw) = tag else {
            return Self::En;
        };
        let folded: String = raw
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                '_' => '-',
                other => other.to_ascii_lowercase(),
            })
            .collect();
        match folded.as_str() {
            "en" | "en-us" => Self::En,
            "zh-cn" | "zhcn" | "zh-hans" => Self::ZhCn,
            "zh-tw" | "zhtw" | "zh-hant" => Self::ZhTw,
            _ => Self::En,
        }
    }

    /// Returns the canonical tag used for catalog file names and wire data.
    #[must_use]
    pub const fn as_tag(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::ZhCn => "zh-CN",
            Self::ZhTw => "zh-TW",
        }
    }

    /// Whether this is the default locale (no translation disclaimer needed).
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::En)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simplified_chinese_aliases_collapse() {
        for tag in ["zh_cn", "zh-CN", "ZH_CN", "zhCN", "zh-Hans", " zh_cn "] {
            assert_eq!(Locale::normalize(Some(tag)), Locale::ZhCn, "tag {tag}");
        }
    }

    #[test]
    fn traditional_chinese_aliases_collapse() {
        for tag in ["zh_tw", "zh-TW", "zh-Hant", "zhTW"] {
            assert_eq!(Locale::normalize(Some(tag)), Locale::ZhTw, "tag {tag}");
        }
    }

    #[test]
    fn unknown_and_missing_tags_default_to_english() {
        assert_eq!(Locale::normalize(Some("klingon")), Locale::En);
        assert_eq!(Locale::normalize(Some("")), Locale::En);
        assert_eq!(Locale::normalize(Some("   ")), Locale::En);
        assert_eq!(Locale::normalize(None), Locale::En);
    }

    #[test]
    fn english_variants() {
        assert_eq!(Locale::normalize(Some("EN")), Locale::En);
        assert_eq!(Locale::normalize(Some("en_US")), Locale::En);
    }

    #[test]
    fn tags_round_trip() {
        assert_eq!(Locale::ZhCn.as_tag(), "zh-CN");
        assert_eq!(Locale::normalize(Some(Locale::ZhTw.as_tag())), Locale::ZhTw);
    }
}
