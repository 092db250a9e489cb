use std::collections::{BTreeMap, HashMap};

use indexmap::{IndexMap, IndexSet};
use swc_core::common::{Span, SyntaxContext, DUMMY_SP};
use swc_core::ecma::ast::{
    ComputedPropName, Expr, Ident, IdentName, Lit, MemberExpr, MemberProp,
};
use swc_core::ecma::utils::{is_valid_prop_ident, quote_str, ExprFactory};

const LOAD_FN: &str = "require";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingKind {
    /// `import * as x from 'm'`
    Namespace,
    /// `import x from 'm'`
    Default,
    /// `import { y as x } from 'm'`, holds `y`
    Named(String),
}

/// One imported local name and the expression that replaces its uses.
#[derive(Debug, Clone)]
pub struct ModuleBinding {
    pub local: String,
    pub ctxt: SyntaxContext,
    pub source: String,
    pub kind: BindingKind,
    code: String,
}

impl ModuleBinding {
    pub fn new(local: String, ctxt: SyntaxContext, source: String, kind: BindingKind) -> Self {
        let load = format!("{}({})", LOAD_FN, single_quoted(&source));
        let code = match &kind {
            BindingKind::Namespace => load,
            BindingKind::Default => format!("{}.default", load),
            BindingKind::Named(imported) if is_valid_prop_ident(imported) => {
                format!("{}.{}", load, imported)
            }
            BindingKind::Named(imported) => format!("{}[{}]", load, single_quoted(imported)),
        };
        Self {
            local,
            ctxt,
            source,
            kind,
            code,
        }
    }

    /// The replacement as literal source text.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The replacement as an expression tree, `require` resolving to the
    /// global binding.
    pub fn to_expr(&self, unresolved_ctxt: SyntaxContext) -> Expr {
        let load = Expr::Ident(Ident::new(LOAD_FN.into(), DUMMY_SP, unresolved_ctxt))
            .as_call(DUMMY_SP, vec![quote_str!(self.source.clone()).as_arg()]);
        let prop = match &self.kind {
            BindingKind::Namespace => return load,
            BindingKind::Default => member_prop("default"),
            BindingKind::Named(imported) if is_valid_prop_ident(imported) => member_prop(imported),
            BindingKind::Named(imported) => MemberProp::Computed(ComputedPropName {
                span: DUMMY_SP,
                expr: Box::new(Expr::Lit(Lit::Str(quote_str!(imported.clone())))),
            }),
        };
        Expr::Member(MemberExpr {
            span: DUMMY_SP,
            obj: Box::new(load),
            prop,
        })
    }

    /// Whether an identifier with this context names this binding rather than
    /// a local declaration that shadows it. Unresolved trees carry empty
    /// contexts everywhere and always match.
    pub fn is_referenced_by(&self, ctxt: SyntaxContext) -> bool {
        self.ctxt == ctxt
    }
}

fn member_prop(name: &str) -> MemberProp {
    MemberProp::Ident(IdentName {
        span: DUMMY_SP,
        sym: name.into(),
    })
}

fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// How a replacement is written into the tree, chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substitution {
    /// Graft the replacement expression tree.
    Structural,
    /// Overwrite the identifier's text with the replacement source.
    Textual,
}

impl Substitution {
    pub fn replace(
        &self,
        binding: &ModuleBinding,
        span: Span,
        unresolved_ctxt: SyntaxContext,
    ) -> Expr {
        match self {
            Substitution::Structural => binding.to_expr(unresolved_ctxt),
            Substitution::Textual => Expr::Ident(Ident::new(
                binding.code().into(),
                span,
                SyntaxContext::empty(),
            )),
        }
    }
}

/// Deferred removal of the import declarations of one module. Taking it out
/// of the pending registry is what fires it, so it can fire only once.
#[derive(Debug)]
pub struct RemovalAction {
    source: String,
    declarations: Vec<usize>,
}

impl RemovalAction {
    fn run(self, removed: &mut BTreeMap<usize, String>) -> String {
        for declaration in self.declarations {
            removed.insert(declaration, self.source.clone());
        }
        self.source
    }
}

/// Everything the inliner knows about one file while walking it.
#[derive(Debug, Default)]
pub struct FileState {
    bindings: HashMap<String, ModuleBinding>,
    pending: IndexMap<String, RemovalAction>,
    removed: BTreeMap<usize, String>,
    removed_sources: Vec<String>,
    /// Modules whose declarations stay whatever their other uses are.
    pinned: IndexSet<String>,
}

impl FileState {
    /// Stores `binding`, returning the one it supersedes.
    pub fn bind(&mut self, binding: ModuleBinding) -> Option<ModuleBinding> {
        self.bindings.insert(binding.local.clone(), binding)
    }

    pub fn binding(&self, local: &str) -> Option<&ModuleBinding> {
        self.bindings.get(local)
    }

    /// Registers removal of the import declaration at `declaration` (its
    /// index in the module body). Declarations of a module whose removal is
    /// still pending share one action.
    pub fn register_removal(&mut self, source: &str, declaration: usize) {
        if self.pinned.contains(source) {
            return;
        }
        self.pending
            .entry(source.to_string())
            .or_insert_with(|| RemovalAction {
                source: source.to_string(),
                declarations: vec![],
            })
            .declarations
            .push(declaration);
    }

    /// Fires the pending removal for `source`. Returns false when there is
    /// none, either never registered or already fired.
    pub fn trigger_removal(&mut self, source: &str) -> bool {
        match self.pending.shift_remove(source) {
            Some(action) => {
                let source = action.run(&mut self.removed);
                self.removed_sources.push(source);
                true
            }
            None => false,
        }
    }

    /// Keeps every declaration of `source`, dropping its pending removal or
    /// undoing one that already fired. Returns false when it was pinned
    /// before.
    pub fn pin(&mut self, source: &str) -> bool {
        if !self.pinned.insert(source.to_string()) {
            return false;
        }
        self.pending.shift_remove(source);
        self.removed.retain(|_, removed| removed != source);
        self.removed_sources.retain(|removed| removed != source);
        true
    }

    pub fn pinned_sources(&self) -> impl Iterator<Item = &str> {
        self.pinned.iter().map(|source| source.as_str())
    }

    pub fn pending_sources(&self) -> impl Iterator<Item = &str> {
        self.pending.keys().map(|source| source.as_str())
    }

    /// Module body indexes of the declarations to drop, with their module.
    pub fn removed_declarations(&self) -> &BTreeMap<usize, String> {
        &self.removed
    }

    pub fn removed_sources(&self) -> &[String] {
        &self.removed_sources
    }
}

/// Per-file states of a run, keyed by file identity.
#[derive(Debug, Default)]
pub(crate) struct FileStates {
    states: HashMap<String, FileState>,
}

impl FileStates {
    pub fn state_for(&mut self, file: &str) -> &mut FileState {
        self.states.entry(file.to_string()).or_default()
    }

    pub fn discard(&mut self, file: &str) -> Option<FileState> {
        self.states.remove(file)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use swc_core::common::SyntaxContext;

    use super::{BindingKind, FileState, FileStates, ModuleBinding};

    fn binding(local: &str, source: &str, kind: BindingKind) -> ModuleBinding {
        ModuleBinding::new(
            local.to_string(),
            SyntaxContext::empty(),
            source.to_string(),
            kind,
        )
    }

    #[test]
    fn test_code() {
        assert_eq!(
            binding("ns", "module", BindingKind::Namespace).code(),
            "require('module')"
        );
        assert_eq!(
            binding("def", "module", BindingKind::Default).code(),
            "require('module').default"
        );
        assert_eq!(
            binding("x", "module", BindingKind::Named("namespace".to_string())).code(),
            "require('module').namespace"
        );
        assert_eq!(
            binding("x", "module", BindingKind::Named("a-b".to_string())).code(),
            "require('module')['a-b']"
        );
        assert_eq!(
            binding("x", "it's", BindingKind::Namespace).code(),
            "require('it\\'s')"
        );
    }

    #[test]
    fn test_last_binding_wins() {
        let mut state = FileState::default();
        assert!(state
            .bind(binding("x", "a", BindingKind::Named("x".to_string())))
            .is_none());
        let superseded = state
            .bind(binding("x", "b", BindingKind::Default))
            .unwrap();
        assert_eq!(superseded.source, "a");
        assert_eq!(state.binding("x").unwrap().source, "b");
    }

    #[test]
    fn test_removal_is_idempotent() {
        let mut state = FileState::default();
        state.register_removal("module", 0);
        assert_eq!(state.pending_sources().collect::<Vec<_>>(), vec!["module"]);
        assert!(state.trigger_removal("module"));
        assert!(!state.trigger_removal("module"));
        assert!(!state.trigger_removal("module"));
        assert_eq!(state.removed_declarations().keys().collect::<Vec<_>>(), vec![&0]);
        assert_eq!(state.removed_sources(), &["module".to_string()]);
        assert_eq!(state.pending_sources().count(), 0);
    }

    #[test]
    fn test_removal_covers_every_pending_declaration() {
        let mut state = FileState::default();
        state.register_removal("module", 0);
        state.register_removal("other", 1);
        state.register_removal("module", 3);
        assert!(state.trigger_removal("module"));
        assert_eq!(
            state.removed_declarations().keys().copied().collect::<Vec<_>>(),
            vec![0, 3]
        );
        assert_eq!(state.pending_sources().collect::<Vec<_>>(), vec!["other"]);
    }

    #[test]
    fn test_pin_undoes_a_fired_removal() {
        let mut state = FileState::default();
        state.register_removal("module", 0);
        state.register_removal("other", 1);
        assert!(state.trigger_removal("module"));
        assert!(state.trigger_removal("other"));
        assert!(state.pin("module"));
        assert!(!state.pin("module"));
        assert_eq!(
            state.removed_declarations().keys().copied().collect::<Vec<_>>(),
            vec![1]
        );
        assert_eq!(state.removed_sources(), &["other".to_string()]);
        assert_eq!(state.pinned_sources().collect::<Vec<_>>(), vec!["module"]);
    }

    #[test]
    fn test_pinned_module_is_never_removed() {
        let mut state = FileState::default();
        state.register_removal("module", 0);
        assert!(state.pin("module"));
        assert_eq!(state.pending_sources().count(), 0);
        state.register_removal("module", 2);
        assert!(!state.trigger_removal("module"));
        assert!(state.removed_declarations().is_empty());
    }

    #[test]
    fn test_unknown_removal_is_noop() {
        let mut state = FileState::default();
        assert!(!state.trigger_removal("module"));
        assert!(state.removed_declarations().is_empty());
    }

    #[test]
    fn test_states_are_partitioned_by_file() {
        let mut states = FileStates::default();
        states
            .state_for("a.js")
            .bind(binding("x", "m", BindingKind::Default));
        assert!(states.state_for("b.js").binding("x").is_none());
        assert_eq!(states.len(), 2);
        assert!(states.discard("a.js").unwrap().binding("x").is_some());
        assert!(states.state_for("a.js").binding("x").is_none());
    }
}
