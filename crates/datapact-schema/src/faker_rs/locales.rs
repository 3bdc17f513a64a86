use std::fmt;

use serde::{Deserialize, Serialize};

/// Locale used for realistic string data.
///
/// Only name categories are localized; every other category renders with
/// `en_US` data whatever the locale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocaleKey {
    #[default]
    #[serde(rename = "en_US", alias = "en-US")]
    EnUs,
    #[serde(rename = "pt_BR", alias = "pt-BR")]
    PtBr,
}

impl LocaleKey {
    pub const ALL: [LocaleKey; 2] = [LocaleKey::EnUs, LocaleKey::PtBr];

    /// Accepts `en_US`, `en-us`, `PT_br` and similar spellings.
    pub fn parse(value: &str) -> Option<Self> {
        let tag = value.trim().replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|locale| locale.as_str().to_ascii_lowercase() == tag)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnUs => "en_US",
            Self::PtBr => "pt_BR",
        }
    }
}

impl fmt::Display for LocaleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
