use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, Result};

/// A named connection profile: where the source lives, where the
/// warehouse lives, and which warehouse tables this sync targets.
/// Credentials stay opaque to the pipeline stages; they only hand the
/// connection strings to the driver.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub source_db: String,
    pub warehouse_db: String,

    #[serde(default = "default_articles_table")]
    pub articles_table: String,

    #[serde(default = "default_word_counts_table")]
    pub word_counts_table: String,
}

fn default_articles_table() -> String {
    "articles".to_string()
}

fn default_word_counts_table() -> String {
    "word_counts".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub profiles: HashMap<String, Profile>,
}

impl Config {
    /// Load a config file from an explicit path. The path comes from
    /// the invoker; nothing here guesses at ambient locations.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config =
            toml::from_str(&content).map_err(|e| AppError::Config(e.to_string()))?;
        Ok(config)
    }

    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles.get(name).ok_or_else(|| {
            AppError::Config(format!("no profile named '{name}' in config"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_resolves_named_profile_with_table_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [profiles.default]
            source_db = "source.db"
            warehouse_db = "warehouse.db"

            [profiles.staging]
            source_db = "staging-source.db"
            warehouse_db = "staging-warehouse.db"
            articles_table = "articles_stg"
            word_counts_table = "word_counts_stg"
            "#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        let default = config.profile("default").unwrap();
        assert_eq!(default.source_db, "source.db");
        assert_eq!(default.articles_table, "articles");
        assert_eq!(default.word_counts_table, "word_counts");

        let staging = config.profile("staging").unwrap();
        assert_eq!(staging.articles_table, "articles_stg");
    }

    #[test]
    fn unknown_profile_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[profiles.default]\nsource_db = \"a\"\nwarehouse_db = \"b\"\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        let err = config.profile("missing").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
