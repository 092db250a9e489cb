use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use swc_core::common::comments::Comments;
use swc_core::common::{FileName, Mark, Spanned, GLOBALS};
use swc_core::ecma::ast::{EsVersion, Module};
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::codegen::{Config as JsCodegenConfig, Emitter};
use swc_core::ecma::parser::error::SyntaxError;
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};
use swc_core::ecma::transforms::base::fixer::fixer;
use swc_core::ecma::transforms::base::resolver;
use swc_core::ecma::visit::VisitMutWith;

use crate::ast::error;
use crate::ast::file::File;
use crate::context::Context;

pub struct JsAst {
    pub ast: Module,
    pub unresolved_mark: Mark,
    pub top_level_mark: Mark,
    pub path: String,
    context: Arc<Context>,
}

impl fmt::Debug for JsAst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsAst({})", self.path)
    }
}

impl JsAst {
    pub fn new(file: &File, context: Arc<Context>) -> Result<Self> {
        let fm = context
            .meta
            .script
            .cm
            .new_source_file(FileName::Real(file.path.clone()).into(), file.get_content_raw());
        let comments: &dyn Comments = &context.meta.script.origin_comments;
        let is_ts = file.is_typescript();
        let syntax = if is_ts {
            Syntax::Typescript(TsSyntax {
                tsx: file.extname == "tsx",
                decorators: true,
                ..Default::default()
            })
        } else {
            Syntax::Es(EsSyntax {
                jsx: file.extname != "mjs" && file.extname != "cjs",
                decorators: true,
                decorators_before_export: true,
                ..Default::default()
            })
        };
        let lexer = Lexer::new(
            syntax,
            EsVersion::latest(),
            StringInput::from(&*fm),
            Some(comments),
        );
        let mut parser = Parser::new_from(lexer);
        let ast = parser.parse_module();

        // handle ast errors
        let mut ast_errors = parser.take_errors();
        // ignore with syntax error in strict mode
        ast_errors.retain_mut(|error| !matches!(error.kind(), SyntaxError::WithInStrict));
        let ast = match ast {
            Ok(ast) => Some(ast),
            Err(err) => {
                ast_errors.push(err);
                None
            }
        };
        if !ast_errors.is_empty() {
            let cm = &context.meta.script.cm;
            let messages = ast_errors
                .iter()
                .map(|err| error::code_location(err.span(), err.kind().msg().as_ref(), cm))
                .collect::<Vec<String>>();
            return Err(anyhow!(error::ParseError::JsParseError {
                messages: messages.join("\n")
            }));
        }
        let mut ast = ast.ok_or_else(|| anyhow!("parser returned neither a module nor errors"))?;

        // top level mark and unresolved mark need to be persisted for transform usage
        GLOBALS.set(&context.meta.script.globals, || {
            let top_level_mark = Mark::new();
            let unresolved_mark = Mark::new();
            ast.visit_mut_with(&mut resolver(unresolved_mark, top_level_mark, is_ts));
            Ok(JsAst {
                ast,
                unresolved_mark,
                top_level_mark,
                path: file.identity(),
                context: context.clone(),
            })
        })
    }

    /// Runs `f` against the module with the swc globals this ast was
    /// resolved with, so marks can be applied.
    pub fn transform<R>(&mut self, f: impl FnOnce(&mut Module, Mark, Mark) -> R) -> R {
        let context = self.context.clone();
        let unresolved_mark = self.unresolved_mark;
        let top_level_mark = self.top_level_mark;
        GLOBALS.set(&context.meta.script.globals, || {
            f(&mut self.ast, unresolved_mark, top_level_mark)
        })
    }

    pub fn generate(&mut self) -> Result<String> {
        let context = self.context.clone();
        let comments: &dyn Comments = &context.meta.script.origin_comments;
        GLOBALS.set(&context.meta.script.globals, || {
            self.ast.visit_mut_with(&mut fixer(Some(comments)));
        });

        let cm = context.meta.script.cm.clone();
        let mut buf = vec![];
        {
            let mut emitter = Emitter {
                cfg: JsCodegenConfig::default().with_target(EsVersion::latest()),
                cm: cm.clone(),
                comments: Some(comments),
                wr: JsWriter::new(cm.clone(), "\n", &mut buf, None),
            };
            emitter.emit_module(&self.ast).map_err(|err| {
                anyhow!(error::GenerateError::JsGenerateError {
                    message: err.to_string()
                })
            })?;
        }

        let code = String::from_utf8(buf)?;
        Ok(code)
    }
}
