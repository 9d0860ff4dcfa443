use swc_core::common::comments::{Comment, CommentKind, Comments};
use swc_core::common::Span;
use swc_core::ecma::ast::{
    ArrayLit, Callee, Expr, ExprOrSpread, ObjectLit, Prop, PropName, PropOrSpread, Stmt, UnaryOp,
};

/// Decides whether a top-level statement can be dropped when nothing references it.
pub struct PureChecker<'a> {
    comments: Option<&'a dyn Comments>,
}

impl<'a> PureChecker<'a> {
    pub fn new(comments: Option<&'a dyn Comments>) -> Self {
        Self { comments }
    }

    pub fn is_pure_stmt(&self, stmt: &Stmt) -> bool {
        match stmt {
            Stmt::Empty(_) => true,
            Stmt::Expr(expr_stmt) => self.is_pure_expr(&expr_stmt.expr),
            _ => false,
        }
    }

    pub fn is_pure_expr(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Lit(_) | Expr::Ident(_) | Expr::This(_) | Expr::Fn(_) | Expr::Arrow(_) => true,
            Expr::Tpl(tpl) => tpl.exprs.iter().all(|e| self.is_pure_expr(e)),
            Expr::Array(array) => self.is_pure_array(array),
            Expr::Object(object) => self.is_pure_object(object),
            Expr::Unary(unary) => unary.op != UnaryOp::Delete && self.is_pure_expr(&unary.arg),
            Expr::Bin(bin) => self.is_pure_expr(&bin.left) && self.is_pure_expr(&bin.right),
            Expr::Cond(cond) => {
                self.is_pure_expr(&cond.test)
                    && self.is_pure_expr(&cond.cons)
                    && self.is_pure_expr(&cond.alt)
            }
            Expr::Paren(paren) => self.is_pure_expr(&paren.expr),
            Expr::Seq(seq) => seq.exprs.iter().all(|e| self.is_pure_expr(e)),
            Expr::TsAs(e) => self.is_pure_expr(&e.expr),
            Expr::TsNonNull(e) => self.is_pure_expr(&e.expr),
            Expr::TsSatisfies(e) => self.is_pure_expr(&e.expr),
            Expr::TsTypeAssertion(e) => self.is_pure_expr(&e.expr),
            Expr::TsConstAssertion(e) => self.is_pure_expr(&e.expr),
            Expr::TsInstantiation(e) => self.is_pure_expr(&e.expr),
            Expr::Call(call) => {
                matches!(call.callee, Callee::Expr(_))
                    && self.has_pure(call.span)
                    && self.is_pure_args(&call.args)
            }
            Expr::New(new) => {
                self.has_pure(new.span)
                    && new
                        .args
                        .as_ref()
                        .map_or(true, |args| self.is_pure_args(args))
            }
            _ => false,
        }
    }

    fn is_pure_args(&self, args: &[ExprOrSpread]) -> bool {
        args.iter()
            .all(|arg| arg.spread.is_none() && self.is_pure_expr(&arg.expr))
    }

    fn is_pure_array(&self, array: &ArrayLit) -> bool {
        array.elems.iter().flatten().all(|elem| {
            elem.spread.is_none() && self.is_pure_expr(&elem.expr)
        })
    }

    fn is_pure_object(&self, object: &ObjectLit) -> bool {
        object.props.iter().all(|prop| match prop {
            PropOrSpread::Spread(_) => false,
            PropOrSpread::Prop(prop) => match &**prop {
                Prop::Shorthand(_) => true,
                Prop::KeyValue(kv) => self.is_pure_key(&kv.key) && self.is_pure_expr(&kv.value),
                Prop::Method(method) => self.is_pure_key(&method.key),
                Prop::Getter(_) | Prop::Setter(_) | Prop::Assign(_) => false,
            },
        })
    }

    fn is_pure_key(&self, key: &PropName) -> bool {
        match key {
            PropName::Computed(computed) => self.is_pure_expr(&computed.expr),
            _ => true,
        }
    }

    /**
     * Check for `/*#__PURE__*/`
     */
    fn has_pure(&self, span: Span) -> bool {
        self.has_flag(span, "PURE")
    }

    fn find_comment<F>(&self, span: Span, mut op: F) -> bool
    where
        F: FnMut(&Comment) -> bool,
    {
        let Some(comments) = self.comments else {
            return false;
        };
        comments
            .get_leading(span.lo)
            .is_some_and(|cs| cs.iter().any(|c| op(c)))
    }

    fn has_flag(&self, span: Span, text: &'static str) -> bool {
        self.find_comment(span, |c| {
            c.kind == CommentKind::Block
                && c.text.len() == text.len() + 5
                && (c.text.starts_with("#__") || c.text.starts_with("@__"))
                && c.text.ends_with("__")
                && text == &c.text[3..c.text.len() - 2]
        })
    }
}
