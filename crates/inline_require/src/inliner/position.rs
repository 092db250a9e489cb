//! Where an identifier sits relative to its parent node, and the ordered
//! rules that keep a bound identifier from being inlined because of where it
//! sits.
//!
//! Every bound, unshadowed name the walk meets is classified through these
//! rules. The swc AST never holds a declaration name or a property key in an
//! expression slot, so for those positions the walk already keeps the name
//! and the matching rule only names the reason in verbose logs. JSX element
//! names are the position where a rule changes the outcome: the name is kept
//! and its import is pinned instead of inlined.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    ImportSpecifier,
    MemberExpr,
    ObjectProp,
    Function,
    ArrowExpr,
    FnDecl,
    FnExpr,
    ExportSpecifier,
    VarDeclarator,
    CallExpr,
    /// Opening or closing tag, `<A />` or the root of `<A.B />`.
    JSXElement,
    /// Any other expression holder: operands, arguments, initializers.
    Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Local,
    Object,
    Property,
    Key,
    Value,
    Param(usize),
    Ident,
    Name,
    Callee,
    Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub parent: Parent,
    pub slot: Slot,
}

impl Position {
    pub const EXPR: Position = Position::new(Parent::Expr, Slot::Expr);

    pub const fn new(parent: Parent, slot: Slot) -> Self {
        Self { parent, slot }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::EXPR
    }
}

pub struct ExclusionRule {
    pub name: &'static str,
    test: fn(&Position) -> bool,
}

impl ExclusionRule {
    pub fn matches(&self, position: &Position) -> bool {
        (self.test)(position)
    }
}

pub static EXCLUSION_RULES: &[ExclusionRule] = &[
    ExclusionRule {
        name: "import_specifier",
        test: |p| p.parent == Parent::ImportSpecifier,
    },
    ExclusionRule {
        name: "member_property",
        test: |p| p.parent == Parent::MemberExpr && p.slot != Slot::Object,
    },
    ExclusionRule {
        name: "object_property_key",
        test: |p| p.parent == Parent::ObjectProp && p.slot == Slot::Key,
    },
    ExclusionRule {
        name: "function_param",
        test: |p| matches!(p.slot, Slot::Param(_)),
    },
    ExclusionRule {
        name: "named_function",
        test: |p| matches!(p.parent, Parent::FnDecl | Parent::FnExpr) && p.slot == Slot::Ident,
    },
    ExclusionRule {
        name: "export_specifier",
        test: |p| p.parent == Parent::ExportSpecifier,
    },
    ExclusionRule {
        name: "variable_declarator",
        test: |p| p.parent == Parent::VarDeclarator && p.slot == Slot::Name,
    },
    ExclusionRule {
        name: "call_callee",
        test: |p| p.parent == Parent::CallExpr && p.slot == Slot::Callee,
    },
    ExclusionRule {
        name: "jsx_element_name",
        test: |p| p.parent == Parent::JSXElement,
    },
];

/// First rule, in order, that keeps an identifier at `position` as is.
pub fn excluding_rule(position: &Position) -> Option<&'static ExclusionRule> {
    EXCLUSION_RULES.iter().find(|rule| rule.matches(position))
}

#[cfg(test)]
mod tests {
    use super::{excluding_rule, Parent, Position, Slot};

    fn rule_name(parent: Parent, slot: Slot) -> Option<&'static str> {
        excluding_rule(&Position::new(parent, slot)).map(|rule| rule.name)
    }

    #[test]
    fn test_references_are_not_excluded() {
        assert_eq!(rule_name(Parent::Expr, Slot::Expr), None);
        assert_eq!(rule_name(Parent::MemberExpr, Slot::Object), None);
        assert_eq!(rule_name(Parent::ObjectProp, Slot::Value), None);
        assert_eq!(rule_name(Parent::CallExpr, Slot::Expr), None);
    }

    #[test]
    fn test_declarations_are_excluded() {
        assert_eq!(
            rule_name(Parent::ImportSpecifier, Slot::Local),
            Some("import_specifier")
        );
        assert_eq!(
            rule_name(Parent::Function, Slot::Param(1)),
            Some("function_param")
        );
        assert_eq!(
            rule_name(Parent::ArrowExpr, Slot::Param(0)),
            Some("function_param")
        );
        assert_eq!(rule_name(Parent::FnDecl, Slot::Ident), Some("named_function"));
        assert_eq!(rule_name(Parent::FnExpr, Slot::Ident), Some("named_function"));
        assert_eq!(
            rule_name(Parent::VarDeclarator, Slot::Name),
            Some("variable_declarator")
        );
    }

    #[test]
    fn test_names_that_are_not_references() {
        assert_eq!(
            rule_name(Parent::MemberExpr, Slot::Property),
            Some("member_property")
        );
        assert_eq!(
            rule_name(Parent::ObjectProp, Slot::Key),
            Some("object_property_key")
        );
        assert_eq!(
            rule_name(Parent::ExportSpecifier, Slot::Local),
            Some("export_specifier")
        );
        assert_eq!(rule_name(Parent::CallExpr, Slot::Callee), Some("call_callee"));
        assert_eq!(
            rule_name(Parent::JSXElement, Slot::Name),
            Some("jsx_element_name")
        );
    }

    #[test]
    fn test_first_rule_wins() {
        // a parameter slot inside an import specifier is reported by the earlier rule
        assert_eq!(
            rule_name(Parent::ImportSpecifier, Slot::Param(0)),
            Some("import_specifier")
        );
    }
}
