use swc_core::ecma::ast::{
    ExportSpecifier, Ident, ModuleExportName, ModuleItem, NamedExport, VarDeclKind,
};
use swc_core::ecma::utils::ExprFactory;
use tracing::debug;

use super::rewriter::InlineRequireVisitor;

const EXPORTED_PREFIX: &str = "__inlineRequire_exported_";

/// Name of the constant that carries `local` out under `exported`.
pub(super) fn exported_const_name(exported: &ModuleExportName, local: &str) -> String {
    let exported = match exported {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(name) => name
            .value
            .chars()
            .map(|c| if Ident::is_valid_continue(c) { c } else { '_' })
            .collect(),
    };
    format!("{}{}__{}", EXPORTED_PREFIX, exported, local)
}

impl InlineRequireVisitor<'_> {
    /// `name`, or `name_1`, `name_2`, ... when the module already declares it.
    /// Distinct export names can sanitize to the same text, `"a-b"` and
    /// `a_b` both give `a_b`.
    fn undeclared_name(&mut self, name: String) -> String {
        let mut candidate = name.clone();
        let mut suffix = 1;
        while !self.declared.insert(candidate.clone()) {
            candidate = format!("{}_{}", name, suffix);
            suffix += 1;
        }
        candidate
    }

    /// `export { a, a as b }` of bound names. An export specifier can only
    /// name a local binding, so each one is pointed at a new constant holding
    /// the replacement. Returns the constant declarations, to be placed right
    /// before the export.
    pub(super) fn rewrite_export(&mut self, export: &mut NamedExport) -> Vec<ModuleItem> {
        if export.type_only || export.src.is_some() {
            return vec![];
        }
        let mut decls: Vec<ModuleItem> = vec![];
        for specifier in export.specifiers.iter_mut() {
            let ExportSpecifier::Named(named) = specifier else {
                continue;
            };
            if named.is_type_only {
                continue;
            }
            let ModuleExportName::Ident(orig) = &named.orig else {
                continue;
            };
            let binding = match self.state.binding(&orig.sym) {
                Some(binding) if binding.is_referenced_by(orig.ctxt) => binding.clone(),
                _ => continue,
            };
            let span = orig.span;
            let exported = named
                .exported
                .take()
                .unwrap_or_else(|| ModuleExportName::Ident(orig.clone()));
            let name = self.undeclared_name(exported_const_name(&exported, &binding.local));
            let local = Ident::new(name.into(), span, self.top_level_ctxt);
            if self.verbose {
                debug!(
                    "{}: exported {} through {}",
                    self.file, binding.local, local.sym
                );
            }
            decls.push(
                self.inline(&binding, span)
                    .into_var_decl(VarDeclKind::Const, local.clone().into())
                    .into(),
            );
            named.orig = ModuleExportName::Ident(local);
            named.exported = Some(exported);
        }
        decls
    }
}

#[cfg(test)]
mod tests {
    use swc_core::common::DUMMY_SP;
    use swc_core::ecma::ast::{ModuleExportName, Str};

    use super::super::tests::{run, run_with_report};
    use super::super::{InlineRequireOptions, Substitution};
    use super::exported_const_name;

    #[test]
    fn test_exported_const_name() {
        let name = ModuleExportName::Str(Str {
            span: DUMMY_SP,
            value: "a-b c".into(),
            raw: None,
        });
        assert_eq!(
            exported_const_name(&name, "x"),
            "__inlineRequire_exported_a_b_c__x"
        );
    }

    #[test]
    fn test_named_export() {
        assert_eq!(
            run("import { a } from 'mod'; export { a };"),
            r#"
const __inlineRequire_exported_a__a = require("mod").a;
export { __inlineRequire_exported_a__a as a };
            "#
            .trim()
        );
    }

    #[test]
    fn test_export_under_two_names() {
        assert_eq!(
            run("import { a } from 'mod'; export { a, a as b };"),
            r#"
const __inlineRequire_exported_a__a = require("mod").a;
const __inlineRequire_exported_b__a = require("mod").a;
export { __inlineRequire_exported_a__a as a, __inlineRequire_exported_b__a as b };
            "#
            .trim()
        );
    }

    #[test]
    fn test_export_names_that_sanitize_alike() {
        assert_eq!(
            run(r#"import { a } from 'mod'; export { a as "a-b", a as a_b };"#),
            r#"
const __inlineRequire_exported_a_b__a = require("mod").a;
const __inlineRequire_exported_a_b__a_1 = require("mod").a;
export { __inlineRequire_exported_a_b__a as "a-b", __inlineRequire_exported_a_b__a_1 as a_b };
            "#
            .trim()
        );
    }

    #[test]
    fn test_export_const_avoids_declared_names() {
        assert_eq!(
            run("import { a } from 'mod'; const __inlineRequire_exported_a__a = 1; export { a };"),
            r#"
const __inlineRequire_exported_a__a = 1;
const __inlineRequire_exported_a__a_1 = require("mod").a;
export { __inlineRequire_exported_a__a_1 as a };
            "#
            .trim()
        );
    }

    #[test]
    fn test_export_is_placed_before_its_statement() {
        assert_eq!(
            run("import ns from 'mod'; const c = 1; export { c, ns as default };"),
            r#"
const c = 1;
const __inlineRequire_exported_default__ns = require("mod").default;
export { c, __inlineRequire_exported_default__ns as default };
            "#
            .trim()
        );
    }

    #[test]
    fn test_reexport_is_untouched() {
        let (code, report) = run_with_report(
            "import { a } from 'mod'; export { a } from 'other';",
            InlineRequireOptions::default(),
        );
        assert_eq!(
            code,
            r#"
import { a } from 'mod';
export { a } from 'other';
            "#
            .trim()
        );
        assert_eq!(report.retained, vec!["mod".to_string()]);
    }

    #[test]
    fn test_textual_export() {
        let options = InlineRequireOptions {
            substitution: Substitution::Textual,
            ..Default::default()
        };
        let (code, _) = run_with_report("import { a } from 'mod'; export { a as b };", options);
        assert_eq!(
            code,
            r#"
const __inlineRequire_exported_b__a = require('mod').a;
export { __inlineRequire_exported_b__a as b };
            "#
            .trim()
        );
    }
}
