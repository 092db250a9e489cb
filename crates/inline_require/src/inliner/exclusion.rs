use regex::Regex;

use crate::config::{Config, ConfigError, MatcherConfig};

#[derive(Debug, Clone)]
enum FileMatcher {
    Exact(String),
    Pattern(Regex),
}

impl FileMatcher {
    fn is_match(&self, file: &str) -> bool {
        match self {
            FileMatcher::Exact(exact) => exact == file,
            FileMatcher::Pattern(regex) => regex.is_match(file),
        }
    }
}

/// Opt-out rules for whole files and for module specifiers. Compiled once
/// from the config and shared by every file of a run.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    files: Vec<FileMatcher>,
    modules: Vec<Regex>,
}

impl ExclusionRules {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let files = config
            .exclude_files
            .iter()
            .enumerate()
            .map(|(index, entry)| match entry {
                MatcherConfig::Exact(exact) => Ok(FileMatcher::Exact(exact.clone())),
                MatcherConfig::Pattern { regex, flags } => MatcherConfig::compile_pattern(
                    regex,
                    flags,
                    &format!("excludeFiles[{}]", index),
                )
                .map(FileMatcher::Pattern),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let modules = config
            .exclude_modules
            .iter()
            .enumerate()
            .map(|(index, entry)| match entry {
                MatcherConfig::Exact(module) if module.ends_with('/') => {
                    Err(ConfigError::TrailingSeparator { index })
                }
                // the module itself or anything below it, but not `module-foo`
                MatcherConfig::Exact(module) => {
                    MatcherConfig::compile_pattern(
                        &format!("^{}(/.*)?$", regex::escape(module)),
                        "s",
                        &format!("excludeModules[{}]", index),
                    )
                }
                MatcherConfig::Pattern { regex, flags } => MatcherConfig::compile_pattern(
                    regex,
                    flags,
                    &format!("excludeModules[{}]", index),
                ),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { files, modules })
    }

    pub fn is_file_excluded(&self, file: &str) -> bool {
        !file.is_empty() && self.files.iter().any(|matcher| matcher.is_match(file))
    }

    pub fn is_module_excluded(&self, source: &str) -> bool {
        !source.is_empty() && self.modules.iter().any(|regex| regex.is_match(source))
    }
}
