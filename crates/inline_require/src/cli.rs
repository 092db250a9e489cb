use std::path::PathBuf;

use clap::Parser;
use serde_json::{json, Map, Value};

/// Rewrites import bindings into inline `require()` calls.
#[derive(Parser, Debug)]
#[command(name = "inline-require", version)]
pub struct Cli {
    /// Directory holding inline-require.config.json
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
    #[arg(short, long)]
    pub verbose: bool,
    /// Overwrite reference text instead of grafting expression trees
    #[arg(long)]
    pub naive_string_replace: bool,
    /// Leave this file alone, replaces `excludeFiles` of the config file
    #[arg(long = "exclude-file", value_name = "FILE")]
    pub exclude_files: Vec<String>,
    /// Never inline this module or its subpaths, replaces `excludeModules`
    #[arg(long = "exclude-module", value_name = "MODULE")]
    pub exclude_modules: Vec<String>,
    /// Write results here, mirroring their path relative to root, instead of
    /// printing them
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl Cli {
    /// The flags that were given, as a config overlay.
    pub fn config_overlay(&self) -> Option<String> {
        let mut overlay = Map::new();
        if self.verbose {
            overlay.insert("verbose".to_string(), Value::Bool(true));
        }
        if self.naive_string_replace {
            overlay.insert("naiveStringReplace".to_string(), Value::Bool(true));
        }
        if !self.exclude_files.is_empty() {
            overlay.insert("excludeFiles".to_string(), json!(self.exclude_files));
        }
        if !self.exclude_modules.is_empty() {
            overlay.insert("excludeModules".to_string(), json!(self.exclude_modules));
        }
        if overlay.is_empty() {
            None
        } else {
            Some(Value::Object(overlay).to_string())
        }
    }
}
