use std::fmt;
use std::path::Path;

use anyhow::{anyhow, Result};
use colored::Colorize;
use miette::{miette, Diagnostic, NamedSource, SourceOffset, SourceSpan};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::inliner::ExclusionRules;

#[derive(Debug, Diagnostic)]
#[diagnostic(code("inline-require.config.json parsed failed"))]
struct ConfigParseError {
    #[source_code]
    src: NamedSource<String>,
    #[label("Error here.")]
    span: SourceSpan,
    message: String,
}

impl std::error::Error for ConfigParseError {}

impl fmt::Display for ConfigParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

fn read_user_config(abs_config_file: &Path) -> miette::Result<Option<Value>> {
    if !abs_config_file.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(abs_config_file).map_err(|e| {
        miette!(
            "Failed to read file '{}': {}",
            abs_config_file.to_string_lossy(),
            e
        )
    })?;
    match serde_json::from_str::<Value>(&content) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            let start = SourceOffset::from_location(&content, e.line(), e.column());
            let span: SourceSpan = (start.offset(), 1).into();
            Err(ConfigParseError {
                src: NamedSource::new(CONFIG_FILE, content),
                span,
                message: e.to_string(),
            }
            .into())
        }
    }
}

/// An `excludeFiles` / `excludeModules` entry: either a plain string or a
/// regular expression with JS-style flags.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum MatcherConfig {
    Exact(String),
    Pattern {
        regex: String,
        #[serde(default)]
        flags: String,
    },
}

impl MatcherConfig {
    /// Builds the pattern form of this entry. Flags with global or sticky
    /// semantics keep match state between calls and are refused.
    pub fn compile_pattern(regex: &str, flags: &str, field: &str) -> Result<Regex, ConfigError> {
        let mut builder = RegexBuilder::new(regex);
        for flag in flags.chars() {
            match flag {
                'g' | 'y' => {
                    return Err(ConfigError::StatefulPatternFlag {
                        field: field.to_string(),
                        flag,
                        regex: regex.to_string(),
                    })
                }
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'u' => {
                    builder.unicode(true);
                }
                _ => {
                    return Err(ConfigError::UnknownPatternFlag {
                        field: field.to_string(),
                        flag,
                    })
                }
            }
        }
        builder.build().map_err(|e| ConfigError::InvalidPattern {
            field: field.to_string(),
            message: e.to_string(),
        })
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    pub verbose: bool,
    pub naive_string_replace: bool,
    pub exclude_files: Vec<MatcherConfig>,
    pub exclude_modules: Vec<MatcherConfig>,
}

pub const CONFIG_FILE: &str = "inline-require.config.json";
const DEFAULT_CONFIG: &str = r#"
{
    "verbose": false,
    "naiveStringReplace": false,
    "excludeFiles": [],
    "excludeModules": []
}
"#;

impl Config {
    pub fn new(root: &Path, cli_config: Option<&str>) -> Result<Self> {
        let mut merged: Value = serde_json::from_str(DEFAULT_CONFIG)?;
        // user config
        let user_config = read_user_config(&root.join(CONFIG_FILE))
            .map_err(|e| anyhow!("{}", format!("{:?}", e)))?;
        if let Some(user_config) = user_config {
            merge_object(&mut merged, user_config, CONFIG_FILE)?;
        }
        // cli config
        if let Some(cli_config) = cli_config {
            let cli_config: Value = serde_json::from_str(cli_config)
                .map_err(|e| anyhow!("{}: invalid cli config: {}", "config error".red(), e))?;
            merge_object(&mut merged, cli_config, "cli")?;
        }
        Self::from_value(merged)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let config = serde_json::from_value::<Config>(value)
            .map_err(|e| anyhow!("{}: {}", "config error".red(), e.to_string().red()))?;
        config.validate()?;
        Ok(config)
    }

    /// Compiles the exclusion rules once so a bad pattern fails the load.
    fn validate(&self) -> Result<(), ConfigError> {
        ExclusionRules::new(self).map(|_| ())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            naive_string_replace: false,
            exclude_files: vec![],
            exclude_modules: vec![],
        }
    }
}

fn merge_object(target: &mut Value, source: Value, origin: &str) -> Result<()> {
    let (Value::Object(target), Value::Object(source)) = (target, source) else {
        return Err(anyhow!(
            "{}: {} config must be a JSON object",
            "config error".red(),
            origin
        ));
    };
    for (key, value) in source {
        target.insert(key, value);
    }
    Ok(())
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field}: forbidden flag \"{flag}\" for pattern /{regex}/, stateful patterns are not supported")]
    StatefulPatternFlag {
        field: String,
        flag: char,
        regex: String,
    },
    #[error("{field}: unknown pattern flag \"{flag}\"")]
    UnknownPatternFlag { field: String, flag: char },
    #[error("{field}: invalid pattern: {message}")]
    InvalidPattern { field: String, message: String },
    #[error("excludeModules[{index}] string value must not end with \"/\"")]
    TrailingSeparator { index: usize },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Config, MatcherConfig};

    fn is_valid(value: serde_json::Value) -> bool {
        let mut base = serde_json::to_value(Config::default()).unwrap();
        for (k, v) in value.as_object().unwrap() {
            base[k] = v.clone();
        }
        Config::from_value(base).is_ok()
    }

    #[test]
    fn test_config() {
        let current_dir = std::env::current_dir().unwrap();
        let config = Config::new(&current_dir.join("test/config/normal"), None).unwrap();
        assert!(config.verbose);
        assert!(!config.naive_string_replace);
        assert_eq!(
            config.exclude_modules,
            vec![
                MatcherConfig::Exact("ignoredModule".to_string()),
                MatcherConfig::Pattern {
                    regex: "^@internal/".to_string(),
                    flags: "i".to_string()
                }
            ]
        );
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let current_dir = std::env::current_dir().unwrap();
        let config = Config::new(&current_dir.join("test/config/not-exists"), None).unwrap();
        assert!(!config.verbose);
        assert!(config.exclude_files.is_empty());
    }

    #[test]
    fn test_config_cli_args() {
        let current_dir = std::env::current_dir().unwrap();
        let config = Config::new(
            &current_dir.join("test/config/normal"),
            Some(r#"{"naiveStringReplace":true,"verbose":false}"#),
        )
        .unwrap();
        assert!(config.naive_string_replace);
        assert!(!config.verbose);
    }

    #[test]
    fn test_invalid_json_points_at_file() {
        let current_dir = std::env::current_dir().unwrap();
        let err = Config::new(&current_dir.join("test/config/invalid-json"), None).unwrap_err();
        assert!(err.to_string().contains("inline-require.config.json"), "{}", err);
    }

    #[test]
    #[should_panic(expected = "forbidden flag \"g\"")]
    fn test_stateful_pattern_in_file() {
        let current_dir = std::env::current_dir().unwrap();
        Config::new(&current_dir.join("test/config/stateful-pattern"), None).unwrap();
    }

    #[test]
    fn test_verbose() {
        assert!(is_valid(json!({ "verbose": true })));
        assert!(!is_valid(json!({ "verbose": "true" })));
    }

    #[test]
    fn test_naive_string_replace() {
        assert!(is_valid(json!({ "naiveStringReplace": true })));
        assert!(!is_valid(json!({ "naiveStringReplace": "true" })));
    }

    #[test]
    fn test_exclude_files() {
        assert!(is_valid(json!({ "excludeFiles": ["str"] })));
        assert!(is_valid(json!({ "excludeFiles": [{ "regex": "str" }] })));
        assert!(!is_valid(json!({ "excludeFiles": [2] })));
        assert!(!is_valid(json!({ "excludeFiles": [{ "regex": "str", "flags": "g" }] })));
        assert!(!is_valid(json!({ "excludeFiles": [{ "regex": "str", "flags": "y" }] })));
        assert!(!is_valid(json!({ "excludeFiles": [{ "regex": "str", "flags": "x" }] })));
        assert!(!is_valid(json!({ "excludeFiles": [{ "regex": "(" }] })));
        assert!(!is_valid(json!({ "excludeFiles": "str" })));
    }

    #[test]
    fn test_exclude_modules() {
        assert!(is_valid(json!({ "excludeModules": ["str"] })));
        assert!(is_valid(json!({ "excludeModules": [{ "regex": "str", "flags": "im" }] })));
        assert!(!is_valid(json!({ "excludeModules": [2] })));
        assert!(!is_valid(json!({ "excludeModules": [{ "regex": "str", "flags": "g" }] })));
        assert!(!is_valid(json!({ "excludeModules": "str" })));
        assert!(!is_valid(json!({ "excludeModules": ["str/"] })));
        // exact strings are escaped, never compiled as written
        assert!(is_valid(json!({ "excludeModules": ["a(b"] })));
    }

    #[test]
    fn test_validation_error_names_the_entry() {
        let mut base = serde_json::to_value(Config::default()).unwrap();
        base["excludeModules"] = json!(["ok", { "regex": "(" }, "str/"]);
        let err = Config::from_value(base).unwrap_err();
        assert!(err.to_string().contains("excludeModules[1]: invalid pattern"), "{}", err);
    }

    #[test]
    fn test_unknown_option() {
        assert!(!is_valid(json!({ "excludeModule": ["str"] })));
    }
}
