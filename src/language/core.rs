use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use serde_json::from_str;
use thiserror::Error;

static LANG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

#[derive(Debug, Error)]
pub enum LanguageError {
    #[error("language file not found: {0}")]
    NotFound(String),
    #[error("language file is not valid UTF-8: {0}")]
    Encoding(String),
    #[error("invalid language file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Word lists bundled into the binary
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SupportedLanguage {
    #[default]
    English,
}

impl SupportedLanguage {
    pub fn load(self) -> Result<Language, LanguageError> {
        Language::load(&self.to_string())
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Language {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl Language {
    pub fn load(name: &str) -> Result<Self, LanguageError> {
        read_language_from_file(&format!("{name}.json"))
    }
}

fn read_language_from_file(file_name: &str) -> Result<Language, LanguageError> {
    let file = LANG_DIR
        .get_file(file_name)
        .ok_or_else(|| LanguageError::NotFound(file_name.to_string()))?;

    let file_as_str = file
        .contents_utf8()
        .ok_or_else(|| LanguageError::Encoding(file_name.to_string()))?;

    Ok(from_str(file_as_str)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_language_load() {
        let lang = SupportedLanguage::English.load().unwrap();

        assert_eq!(lang.name, "english");
        assert!(!lang.words.is_empty());
        assert_eq!(lang.size as usize, lang.words.len());
    }

    #[test]
    fn test_language_deserialization() {
        let json_data = r#"
        {
            "name": "test",
            "size": 3,
            "words": ["hello", "world", "test"]
        }
        "#;

        let lang: Language = from_str(json_data).expect("Failed to deserialize test language");

        assert_eq!(lang.name, "test");
        assert_eq!(lang.size, 3);
        assert!(lang.words.contains(&"world".to_string()));
    }

    #[test]
    fn test_read_nonexistent_language_file() {
        assert_matches!(
            Language::load("nonexistent"),
            Err(LanguageError::NotFound(name)) if name == "nonexistent.json"
        );
    }
}
