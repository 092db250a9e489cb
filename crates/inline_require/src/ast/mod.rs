pub(crate) mod error;
pub mod file;
pub mod js_ast;
