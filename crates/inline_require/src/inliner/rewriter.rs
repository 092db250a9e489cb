use std::collections::HashSet;
use std::mem;

use swc_core::common::{Mark, Span, SyntaxContext};
use swc_core::ecma::ast::{
    ArrowExpr, CallExpr, Callee, Expr, FnDecl, FnExpr, Function, Id, Ident, IdentName,
    JSXElementName, JSXObject, KeyValueProp, MemberExpr, MemberProp, Module, ModuleDecl,
    ModuleItem, Pat, Prop, PropName, VarDeclarator,
};
use swc_core::ecma::utils::{collect_decls, find_pat_ids};
use swc_core::ecma::visit::{noop_visit_mut_type, VisitMut, VisitMutWith};
use tracing::debug;

use super::exclusion::ExclusionRules;
use super::position::{excluding_rule, Parent, Position, Slot};
use super::state::{FileState, ModuleBinding, Substitution};
use super::InlineRequireOptions;

pub(super) enum Reference {
    Unbound,
    /// A local declaration with the same name hides the import.
    Shadowed,
    Excluded(&'static str),
    Inline(ModuleBinding),
}

/// Walks one module in source order. Import declarations feed the binding
/// table, identifier references and calls are rewritten as they are met.
pub(crate) struct InlineRequireVisitor<'a> {
    pub(super) file: &'a str,
    pub(super) state: &'a mut FileState,
    pub(super) exclusion: &'a ExclusionRules,
    pub(super) substitution: Substitution,
    pub(super) verbose: bool,
    pub(super) unresolved_ctxt: SyntaxContext,
    pub(super) top_level_ctxt: SyntaxContext,
    /// Items to insert before the module item at the given index.
    pub(super) insertions: Vec<(usize, Vec<ModuleItem>)>,
    /// Names declared anywhere in the module, synthesized ones included.
    pub(super) declared: HashSet<String>,
    position: Position,
}

impl<'a> InlineRequireVisitor<'a> {
    pub fn new(
        file: &'a str,
        state: &'a mut FileState,
        options: &'a InlineRequireOptions,
        unresolved_mark: Mark,
        top_level_mark: Mark,
    ) -> Self {
        Self {
            file,
            state,
            exclusion: &options.exclusion,
            substitution: options.substitution,
            verbose: options.verbose,
            unresolved_ctxt: SyntaxContext::empty().apply_mark(unresolved_mark),
            top_level_ctxt: SyntaxContext::empty().apply_mark(top_level_mark),
            insertions: vec![],
            declared: HashSet::new(),
            position: Position::EXPR,
        }
    }

    /// Decides what happens to a name at `position`. `ctxt` is `None` for
    /// names that are never scoped, like member and key names.
    pub(super) fn classify(
        &self,
        sym: &str,
        ctxt: Option<SyntaxContext>,
        position: Position,
    ) -> Reference {
        let Some(binding) = self.state.binding(sym) else {
            return Reference::Unbound;
        };
        if let Some(ctxt) = ctxt {
            if !binding.is_referenced_by(ctxt) {
                return Reference::Shadowed;
            }
        }
        match excluding_rule(&position) {
            Some(rule) => Reference::Excluded(rule.name),
            None => Reference::Inline(binding.clone()),
        }
    }

    /// Declarations and non-reference names. These are never rewritten, only
    /// reported.
    pub(super) fn keep(&self, sym: &str, ctxt: Option<SyntaxContext>, position: Position) {
        if !self.verbose {
            return;
        }
        match self.classify(sym, ctxt, position) {
            Reference::Excluded(rule) => debug!("{}: kept {} ({})", self.file, sym, rule),
            Reference::Shadowed => debug!("{}: kept {} (shadowed)", self.file, sym),
            Reference::Unbound | Reference::Inline(_) => {}
        }
    }

    fn keep_pat(&self, pat: &Pat, position: Position) {
        if !self.verbose {
            return;
        }
        for (sym, ctxt) in find_pat_ids::<_, Id>(pat) {
            self.keep(&sym, Some(ctxt), position);
        }
    }

    /// Builds the replacement for a use of `binding` and fires the removal
    /// of its module's import declarations.
    pub(super) fn inline(&mut self, binding: &ModuleBinding, span: Span) -> Expr {
        if self.verbose {
            debug!("{}: replaced {} with {}", self.file, binding.local, binding.code());
        }
        if self.state.trigger_removal(&binding.source) && self.verbose {
            debug!("{}: removed import of {}", self.file, binding.source);
        }
        self.substitution.replace(binding, span, self.unresolved_ctxt)
    }

    fn visit_at<N: VisitMutWith<Self>>(&mut self, node: &mut N, position: Position) {
        self.position = position;
        node.visit_mut_with(self);
        self.position = Position::EXPR;
    }

    /// Call rewriter. Returns false when the callee is not a bound name.
    fn rewrite_call(&mut self, call: &mut CallExpr) -> bool {
        let Callee::Expr(callee) = &mut call.callee else {
            return false;
        };
        let Expr::Ident(ident) = &**callee else {
            return false;
        };
        let binding = match self.state.binding(&ident.sym) {
            Some(binding) if binding.is_referenced_by(ident.ctxt) => binding.clone(),
            _ => return false,
        };
        let span = ident.span;
        **callee = self.inline(&binding, span);
        true
    }

    /// A JSX tag cannot hold an expression, so a module named by a tag keeps
    /// its import declarations.
    fn pin_jsx_name(&mut self, ident: &Ident) {
        let position = Position::new(Parent::JSXElement, Slot::Name);
        let Reference::Excluded(rule) = self.classify(&ident.sym, Some(ident.ctxt), position)
        else {
            return;
        };
        let Some(source) = self
            .state
            .binding(&ident.sym)
            .map(|binding| binding.source.clone())
        else {
            return;
        };
        if self.state.pin(&source) && self.verbose {
            debug!(
                "{}: kept import of {}, {} names a JSX element ({})",
                self.file, source, ident.sym, rule
            );
        }
    }
}

impl VisitMut for InlineRequireVisitor<'_> {
    noop_visit_mut_type!();

    fn visit_mut_module(&mut self, module: &mut Module) {
        self.declared = collect_decls::<Id, _>(&*module)
            .into_iter()
            .map(|id| id.0.to_string())
            .collect();
        for (index, item) in module.body.iter_mut().enumerate() {
            match item {
                ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                    self.index_import(index, import);
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(export)) if export.src.is_none() => {
                    let decls = self.rewrite_export(export);
                    if !decls.is_empty() {
                        self.insertions.push((index, decls));
                    }
                }
                _ => item.visit_mut_with(self),
            }
        }
    }

    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        let position = mem::take(&mut self.position);
        if let Expr::Ident(ident) = expr {
            let span = ident.span;
            let sym = ident.sym.clone();
            match self.classify(&sym, Some(ident.ctxt), position) {
                Reference::Inline(binding) => *expr = self.inline(&binding, span),
                Reference::Excluded(rule) if self.verbose => {
                    debug!("{}: kept {} ({})", self.file, sym, rule)
                }
                _ => {}
            }
            return;
        }
        expr.visit_mut_children_with(self);
    }

    fn visit_mut_call_expr(&mut self, call: &mut CallExpr) {
        if !self.rewrite_call(call) {
            self.visit_at(
                &mut call.callee,
                Position::new(Parent::CallExpr, Slot::Callee),
            );
        }
        call.args.visit_mut_with(self);
    }

    fn visit_mut_member_expr(&mut self, member: &mut MemberExpr) {
        self.visit_at(
            &mut member.obj,
            Position::new(Parent::MemberExpr, Slot::Object),
        );
        match &mut member.prop {
            MemberProp::Ident(name) => self.keep(
                &name.sym,
                None,
                Position::new(Parent::MemberExpr, Slot::Property),
            ),
            prop => prop.visit_mut_with(self),
        }
    }

    fn visit_mut_prop(&mut self, prop: &mut Prop) {
        let Prop::Shorthand(ident) = prop else {
            prop.visit_mut_children_with(self);
            return;
        };
        // `{ x }` is a key and a value at once, only the value is a reference
        self.keep(&ident.sym, None, Position::new(Parent::ObjectProp, Slot::Key));
        let value = Position::new(Parent::ObjectProp, Slot::Value);
        if let Reference::Inline(binding) = self.classify(&ident.sym, Some(ident.ctxt), value) {
            let key = PropName::Ident(IdentName {
                span: ident.span,
                sym: ident.sym.clone(),
            });
            let value = self.inline(&binding, ident.span);
            *prop = Prop::KeyValue(KeyValueProp {
                key,
                value: Box::new(value),
            });
        }
    }

    fn visit_mut_key_value_prop(&mut self, prop: &mut KeyValueProp) {
        prop.key.visit_mut_with(self);
        self.visit_at(
            &mut prop.value,
            Position::new(Parent::ObjectProp, Slot::Value),
        );
    }

    fn visit_mut_prop_name(&mut self, name: &mut PropName) {
        match name {
            PropName::Ident(key) => {
                self.keep(&key.sym, None, Position::new(Parent::ObjectProp, Slot::Key))
            }
            // computed keys are plain expressions
            _ => name.visit_mut_children_with(self),
        }
    }

    fn visit_mut_function(&mut self, function: &mut Function) {
        for (index, param) in function.params.iter().enumerate() {
            self.keep_pat(
                &param.pat,
                Position::new(Parent::Function, Slot::Param(index)),
            );
        }
        function.visit_mut_children_with(self);
    }

    fn visit_mut_arrow_expr(&mut self, arrow: &mut ArrowExpr) {
        for (index, param) in arrow.params.iter().enumerate() {
            self.keep_pat(param, Position::new(Parent::ArrowExpr, Slot::Param(index)));
        }
        arrow.visit_mut_children_with(self);
    }

    fn visit_mut_fn_decl(&mut self, decl: &mut FnDecl) {
        self.keep(
            &decl.ident.sym,
            Some(decl.ident.ctxt),
            Position::new(Parent::FnDecl, Slot::Ident),
        );
        decl.function.visit_mut_with(self);
    }

    fn visit_mut_fn_expr(&mut self, expr: &mut FnExpr) {
        if let Some(ident) = &expr.ident {
            self.keep(
                &ident.sym,
                Some(ident.ctxt),
                Position::new(Parent::FnExpr, Slot::Ident),
            );
        }
        expr.function.visit_mut_with(self);
    }

    fn visit_mut_jsx_element_name(&mut self, name: &mut JSXElementName) {
        match name {
            // lowercase tags are intrinsic elements, not references
            JSXElementName::Ident(ident)
                if !ident.sym.starts_with(|c: char| c.is_ascii_lowercase()) =>
            {
                self.pin_jsx_name(ident)
            }
            JSXElementName::JSXMemberExpr(member) => {
                let mut obj = &member.obj;
                let root = loop {
                    match obj {
                        JSXObject::Ident(ident) => break ident,
                        JSXObject::JSXMemberExpr(inner) => obj = &inner.obj,
                    }
                };
                self.pin_jsx_name(root);
            }
            _ => {}
        }
    }

    fn visit_mut_var_declarator(&mut self, declarator: &mut VarDeclarator) {
        self.keep_pat(
            &declarator.name,
            Position::new(Parent::VarDeclarator, Slot::Name),
        );
        declarator.visit_mut_children_with(self);
    }
}
