use swc_core::ecma::ast::{ImportDecl, ImportSpecifier, ModuleExportName};
use tracing::debug;

use super::position::{Parent, Position, Slot};
use super::rewriter::InlineRequireVisitor;
use super::state::{BindingKind, ModuleBinding};

fn is_type_only(specifier: &ImportSpecifier) -> bool {
    matches!(specifier, ImportSpecifier::Named(named) if named.is_type_only)
}

impl InlineRequireVisitor<'_> {
    /// Binds every local name of `import` and registers removal of the
    /// declaration, `index` being its position in the module body. Nothing is
    /// removed here: a module none of whose names is used keeps its import.
    pub(super) fn index_import(&mut self, index: usize, import: &ImportDecl) {
        if import.type_only {
            return;
        }
        let source = import.src.value.to_string();
        if self.exclusion.is_module_excluded(&source) {
            if self.verbose {
                debug!("{}: module {} is excluded", self.file, source);
            }
            return;
        }
        // `import { type A } from 'm'` is erased
        if !import.specifiers.is_empty() && import.specifiers.iter().all(is_type_only) {
            return;
        }

        for specifier in import.specifiers.iter().filter(|s| !is_type_only(s)) {
            let (local, kind) = match specifier {
                ImportSpecifier::Namespace(namespace) => (&namespace.local, BindingKind::Namespace),
                ImportSpecifier::Default(default) => (&default.local, BindingKind::Default),
                ImportSpecifier::Named(named) => {
                    let imported = match &named.imported {
                        Some(ModuleExportName::Ident(ident)) => ident.sym.to_string(),
                        Some(ModuleExportName::Str(name)) => name.value.to_string(),
                        None => named.local.sym.to_string(),
                    };
                    (&named.local, BindingKind::Named(imported))
                }
            };
            let binding =
                ModuleBinding::new(local.sym.to_string(), local.ctxt, source.clone(), kind);
            if self.verbose {
                debug!(
                    "{}: indexed {} as {}",
                    self.file,
                    binding.local,
                    binding.code()
                );
            }
            if let Some(superseded) = self.state.bind(binding) {
                if self.verbose {
                    debug!(
                        "{}: {} from {} is superseded by a later import",
                        self.file, superseded.local, superseded.source
                    );
                }
            }
            self.keep(
                &local.sym,
                Some(local.ctxt),
                Position::new(Parent::ImportSpecifier, Slot::Local),
            );
        }
        self.state.register_removal(&source, index);
    }
}
