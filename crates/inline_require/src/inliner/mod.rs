mod error;
mod exclusion;
mod exports;
mod indexer;
pub mod position;
mod rewriter;
pub mod state;

use std::collections::BTreeMap;
use std::mem;

use anyhow::Result;
use serde::Serialize;
use swc_core::common::Mark;
use swc_core::ecma::ast::{Module, ModuleDecl, ModuleItem};
use swc_core::ecma::visit::VisitMutWith;
use tracing::{debug, info};

pub use self::error::InlineError;
pub use self::exclusion::ExclusionRules;
use self::rewriter::InlineRequireVisitor;
use self::state::FileStates;
pub use self::state::Substitution;
use crate::ast::js_ast::JsAst;
use crate::config::{Config, ConfigError};

/// Everything a run needs, compiled once from the config.
#[derive(Debug, Clone)]
pub struct InlineRequireOptions {
    pub verbose: bool,
    pub substitution: Substitution,
    pub exclusion: ExclusionRules,
}

impl InlineRequireOptions {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            verbose: config.verbose,
            substitution: if config.naive_string_replace {
                Substitution::Textual
            } else {
                Substitution::Structural
            },
            exclusion: ExclusionRules::new(config)?,
        })
    }
}

impl Default for InlineRequireOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            substitution: Substitution::Structural,
            exclusion: ExclusionRules::default(),
        }
    }
}

/// Outcome of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub file: String,
    pub excluded: bool,
    /// Modules whose import declarations were removed, in the order the
    /// removals fired.
    pub inlined: Vec<String>,
    /// Modules whose imports were kept since nothing they export is used,
    /// presumably imported for their side effects.
    pub retained: Vec<String>,
    /// Modules whose imports were kept since a JSX element is named after one
    /// of their bindings.
    pub pinned: Vec<String>,
}

/// Owns the per-file states of a run. A file's state lives exactly as long
/// as that file's transform.
pub struct InlineRequire {
    options: InlineRequireOptions,
    states: FileStates,
}

impl InlineRequire {
    pub fn new(options: InlineRequireOptions) -> Self {
        Self {
            options,
            states: FileStates::default(),
        }
    }

    pub fn transform(&mut self, ast: &mut JsAst) -> Result<FileReport> {
        let file = ast.path.clone();
        ast.transform(|module, unresolved_mark, top_level_mark| {
            self.transform_module(&file, module, unresolved_mark, top_level_mark)
        })
    }

    /// Rewrites a module that was run through the swc resolver with the given
    /// marks. Must be called inside the `GLOBALS` the marks were created with.
    pub fn transform_module(
        &mut self,
        file: &str,
        module: &mut Module,
        unresolved_mark: Mark,
        top_level_mark: Mark,
    ) -> Result<FileReport> {
        if self.options.exclusion.is_file_excluded(file) {
            if self.options.verbose {
                debug!("{}: file is excluded", file);
            }
            return Ok(FileReport {
                file: file.to_string(),
                excluded: true,
                ..Default::default()
            });
        }
        let report = self.inline_module(file, module, unresolved_mark, top_level_mark);
        self.states.discard(file);
        report
    }

    fn inline_module(
        &mut self,
        file: &str,
        module: &mut Module,
        unresolved_mark: Mark,
        top_level_mark: Mark,
    ) -> Result<FileReport> {
        let state = self.states.state_for(file);
        let mut visitor = InlineRequireVisitor::new(
            file,
            state,
            &self.options,
            unresolved_mark,
            top_level_mark,
        );
        module.visit_mut_with(&mut visitor);
        let insertions = mem::take(&mut visitor.insertions);

        let state = self.states.state_for(file);
        apply_module_edits(file, module, state.removed_declarations(), insertions)?;

        let retained = state
            .pending_sources()
            .map(|source| source.to_string())
            .collect::<Vec<_>>();
        if self.options.verbose {
            for source in &retained {
                info!(
                    "{}: kept import of {}, none of its bindings is used, assuming it is imported for side effects",
                    file, source
                );
            }
        }
        Ok(FileReport {
            file: file.to_string(),
            excluded: false,
            inlined: state.removed_sources().to_vec(),
            retained,
            pinned: state
                .pinned_sources()
                .map(|source| source.to_string())
                .collect(),
        })
    }
}

/// Drops the removed import declarations and places the synthesized items
/// before the item at their index.
fn apply_module_edits(
    file: &str,
    module: &mut Module,
    removed: &BTreeMap<usize, String>,
    insertions: Vec<(usize, Vec<ModuleItem>)>,
) -> Result<(), InlineError> {
    for (index, source) in removed {
        if !matches!(
            module.body.get(*index),
            Some(ModuleItem::ModuleDecl(ModuleDecl::Import(_)))
        ) {
            return Err(InlineError::RemovalNotAnImport {
                file: file.to_string(),
                module: source.clone(),
                index: *index,
            });
        }
    }
    if removed.is_empty() && insertions.is_empty() {
        return Ok(());
    }

    let body = mem::take(&mut module.body);
    let mut insertions = insertions.into_iter().peekable();
    for (index, item) in body.into_iter().enumerate() {
        if let Some((_, items)) = insertions.next_if(|(at, _)| *at == index) {
            module.body.extend(items);
        }
        if !removed.contains_key(&index) {
            module.body.push(item);
        }
    }
    Ok(())
}
