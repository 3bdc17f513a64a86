use std::path::{Path, PathBuf};

use datapact_diff::DiffOptions;
use datapact_schema::{LocaleKey, SynthOptions};
use serde::{Deserialize, Serialize};

use crate::CliError;

pub const DEFAULT_SETTINGS_FILE: &str = "datapact.toml";

/// Contents of `datapact.toml`; every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub seed: Option<u64>,
    pub locale: LocaleKey,
    pub unique_retries: u32,
    pub infer_providers: bool,
    pub identity_keys: Vec<String>,
    pub forbid_unapplied_rules: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let synth = SynthOptions::default();
        let diff = DiffOptions::default();
        Self {
            seed: synth.seed,
            locale: synth.locale,
            unique_retries: synth.unique_retries,
            infer_providers: synth.infer_providers,
            identity_keys: diff.identity_keys,
            forbid_unapplied_rules: diff.forbid_unapplied_rules,
        }
    }
}

impl Settings {
    pub fn parse(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    pub fn synth_options(&self) -> SynthOptions {
        SynthOptions {
            seed: self.seed,
            locale: self.locale,
            infer_providers: self.infer_providers,
            unique_retries: self.unique_retries,
            ..SynthOptions::default()
        }
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            identity_keys: self.identity_keys.clone(),
            forbid_unapplied_rules: self.forbid_unapplied_rules,
            ..DiffOptions::default()
        }
    }
}

/// Load settings from `explicit`, or from `datapact.toml` in the working
/// directory when present. An explicit path must exist.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, CliError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_SETTINGS_FILE);
            if !fallback.exists() {
                return Ok(Settings::default());
            }
            fallback
        }
    };
    let content = std::fs::read_to_string(&path).map_err(|source| CliError::Io {
        path: path.clone(),
        source,
    })?;
    Settings::parse(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.unique_retries, 100);
        assert_eq!(settings.identity_keys, vec!["id".to_string()]);
        assert!(settings.forbid_unapplied_rules);
        assert!(settings.infer_providers);
    }

    #[test]
    fn parses_every_key() {
        let settings = Settings::parse(
            r#"
seed = 42
locale = "pt_BR"
unique_retries = 7
infer_providers = false
identity_keys = ["sku", "code"]
forbid_unapplied_rules = false
"#,
        )
        .unwrap();
        assert_eq!(settings.seed, Some(42));
        assert_eq!(settings.locale, LocaleKey::PtBr);

        let synth = settings.synth_options();
        assert_eq!(synth.unique_retries, 7);
        assert!(!synth.infer_providers);

        let diff = settings.diff_options();
        assert_eq!(diff.identity_keys, vec!["sku".to_string(), "code".to_string()]);
        assert!(!diff.forbid_unapplied_rules);
        assert!(!diff.normalize);
    }

    #[test]
    fn rejects_unknown_locales() {
        assert!(matches!(
            Settings::parse("locale = \"fr_FR\""),
            Err(CliError::Toml(_))
        ));
    }
}
