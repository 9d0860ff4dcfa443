use std::fmt;

use anyhow::{anyhow, Result};
use swc_core::common::comments::SingleThreadedComments;
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, SourceMap, SourceMapper, Span, Spanned};
use swc_core::ecma::ast::{EsVersion, Module};
use swc_core::ecma::parser::error::Error as ParserError;
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::{Parser, StringInput, Syntax, TsSyntax};

use crate::ast::error;
use crate::ast::file::File;
use crate::config::Config;
use crate::error::ShakeError;

/// A parsed source unit, owning its AST and the comments the purity check reads.
pub struct JsAst {
    pub ast: Module,
    pub comments: SingleThreadedComments,
    pub path: String,
    cm: Lrc<SourceMap>,
}

impl fmt::Debug for JsAst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsAst({})", self.path)
    }
}

impl JsAst {
    pub fn new(file: &File, cm: Lrc<SourceMap>, config: &Config) -> Result<Self> {
        let fm = cm.new_source_file(
            FileName::Real(file.path.clone()).into(),
            file.content.clone(),
        );
        let comments = SingleThreadedComments::default();
        let syntax = Syntax::Typescript(TsSyntax {
            tsx: file.extname == "tsx",
            decorators: config.decorators,
            ..Default::default()
        });
        let (result, mut ast_errors) = {
            let lexer = Lexer::new(
                syntax,
                EsVersion::latest(),
                StringInput::from(&*fm),
                Some(&comments),
            );
            let mut parser = Parser::new_from(lexer);
            let result = parser.parse_module();
            let errors = parser.take_errors();
            (result, errors)
        };
        let ast = match result {
            Ok(ast) if ast_errors.is_empty() => ast,
            Ok(_) => return Err(parse_error(file, &ast_errors, &cm)),
            Err(err) => {
                ast_errors.push(err);
                return Err(parse_error(file, &ast_errors, &cm));
            }
        };

        Ok(JsAst {
            ast,
            comments,
            path: file.path_str(),
            cm,
        })
    }

    /// Original source text covered by `span`.
    pub fn snippet(&self, span: Span) -> Result<String> {
        self.cm.span_to_snippet(span).map_err(|err| {
            anyhow!(ShakeError::ParseShape {
                path: self.path.clone(),
                message: format!("cannot extract source text: {:?}", err),
            })
        })
    }

    pub fn code_frame(&self, span: Span, message: &str) -> String {
        error::code_frame(span, message, &self.cm)
    }
}

fn parse_error(file: &File, errors: &[ParserError], cm: &Lrc<SourceMap>) -> anyhow::Error {
    let messages = errors
        .iter()
        .map(|err| error::code_frame(err.span(), &err.kind().msg(), cm))
        .collect::<Vec<String>>();
    anyhow!(ShakeError::Parse {
        path: file.path_str(),
        messages: messages.join("\n"),
    })
}
