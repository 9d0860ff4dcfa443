use std::collections::HashSet;
use std::mem;

use swc_core::ecma::ast::{
    ArrowExpr, AssignTargetPat, BindingIdent, BlockStmt, BlockStmtOrExpr, BreakStmt, CatchClause,
    Class, ClassDecl, ClassExpr, Constructor, ContinueStmt, FnDecl, FnExpr, ForHead, ForInStmt,
    ForOfStmt, ForStmt, Function, Ident, JSXElementName, LabeledStmt, ParamOrTsParamProp, SetterProp,
    SimpleAssignTarget, TsCallSignatureDecl, TsConstructSignatureDecl, TsConstructorType,
    TsEnumDecl, TsEnumMember, TsEnumMemberId, TsFnType, TsGetterSignature, TsInterfaceDecl,
    TsMappedType, TsMethodSignature, TsModuleBlock, TsModuleDecl, TsNamespaceDecl,
    TsParamPropParam, TsPropertySignature, TsSetterSignature, TsTypeAliasDecl, TsTypeParam,
    VarDeclarator,
};
use swc_core::ecma::visit::{Visit, VisitWith};

use crate::module::Reference;
use crate::visitors::defined_ident_collector::{
    collect_block_bindings, collect_module_item_bindings, collect_pat_bindings, VarDeclCollector,
};

/// Collects the free identifiers of a node: every identifier occurrence that is not
/// bound by a parameter, local binding, nested declaration or type parameter of an
/// enclosing scope. Records raw names only, resolution happens in the linker.
pub struct ReferenceCollector {
    pub references: Vec<Reference>,
    scopes: Vec<HashSet<String>>,
    /// Inside an assignment target, where binding identifiers are writes to existing names.
    assigning: bool,
}

impl Default for ReferenceCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceCollector {
    pub fn new() -> Self {
        Self {
            references: vec![],
            scopes: vec![HashSet::new()],
            assigning: false,
        }
    }

    pub fn collect<N>(node: &N) -> Vec<Reference>
    where
        N: VisitWith<Self> + ?Sized,
    {
        let mut collector = Self::new();
        node.visit_with(&mut collector);
        collector.references
    }

    fn is_bound(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|scope| scope.contains(name))
    }

    fn bind(&mut self, name: String) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name);
        }
    }

    fn bind_all(&mut self, names: Vec<String>) {
        for name in names {
            self.bind(name);
        }
    }

    fn with_scope<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.scopes.push(HashSet::new());
        let assigning = mem::replace(&mut self.assigning, false);
        f(self);
        self.assigning = assigning;
        self.scopes.pop();
    }

    fn reference(&mut self, ident: &Ident) {
        let name = ident.sym.as_str();
        if !self.is_bound(name) {
            self.references.push(Reference::new(name.to_string()));
        }
    }

    /// Body names live in their own scope below the parameters, so a default
    /// value never sees a `var` of the body.
    fn walk_function_body(&mut self, body: &BlockStmt) {
        self.with_scope(|this| {
            this.bind_all(VarDeclCollector::collect(&body.stmts));
            this.bind_all(collect_block_bindings(&body.stmts));
            body.stmts.visit_with(this);
        });
    }
}

impl Visit for ReferenceCollector {
    fn visit_ident(&mut self, ident: &Ident) {
        self.reference(ident);
    }

    fn visit_binding_ident(&mut self, binding: &BindingIdent) {
        if self.assigning {
            self.reference(&binding.id);
        }
        binding.type_ann.visit_with(self);
    }

    fn visit_block_stmt(&mut self, block: &BlockStmt) {
        self.with_scope(|this| {
            this.bind_all(collect_block_bindings(&block.stmts));
            block.stmts.visit_with(this);
        });
    }

    fn visit_function(&mut self, function: &Function) {
        self.with_scope(|this| {
            this.bind("arguments".to_string());
            function.type_params.visit_with(this);
            for param in &function.params {
                this.bind_all(collect_pat_bindings(&param.pat));
            }
            function.decorators.visit_with(this);
            function.params.visit_with(this);
            function.return_type.visit_with(this);
            if let Some(body) = &function.body {
                this.walk_function_body(body);
            }
        });
    }

    fn visit_arrow_expr(&mut self, arrow: &ArrowExpr) {
        self.with_scope(|this| {
            arrow.type_params.visit_with(this);
            for param in &arrow.params {
                this.bind_all(collect_pat_bindings(param));
            }
            arrow.params.visit_with(this);
            arrow.return_type.visit_with(this);
            match &*arrow.body {
                BlockStmtOrExpr::BlockStmt(body) => this.walk_function_body(body),
                BlockStmtOrExpr::Expr(expr) => expr.visit_with(this),
            }
        });
    }

    fn visit_constructor(&mut self, constructor: &Constructor) {
        self.with_scope(|this| {
            this.bind("arguments".to_string());
            for param in &constructor.params {
                match param {
                    ParamOrTsParamProp::Param(param) => {
                        this.bind_all(collect_pat_bindings(&param.pat));
                    }
                    ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                        TsParamPropParam::Ident(binding) => this.bind(binding.id.sym.to_string()),
                        TsParamPropParam::Assign(assign) => {
                            this.bind_all(collect_pat_bindings(&assign.left))
                        }
                    },
                }
            }
            constructor.key.visit_with(this);
            constructor.params.visit_with(this);
            if let Some(body) = &constructor.body {
                this.walk_function_body(body);
            }
        });
    }

    fn visit_setter_prop(&mut self, setter: &SetterProp) {
        self.with_scope(|this| {
            this.bind_all(collect_pat_bindings(&setter.param));
            setter.key.visit_with(this);
            setter.param.visit_with(this);
            if let Some(body) = &setter.body {
                this.walk_function_body(body);
            }
        });
    }

    // intrinsic elements (`<div>`) are tag names, not bindings
    fn visit_jsx_element_name(&mut self, name: &JSXElementName) {
        match name {
            JSXElementName::Ident(ident) if ident.sym.starts_with(char::is_lowercase) => {}
            JSXElementName::JSXNamespacedName(_) => {}
            _ => name.visit_children_with(self),
        }
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause) {
        self.with_scope(|this| {
            if let Some(param) = &clause.param {
                this.bind_all(collect_pat_bindings(param));
            }
            clause.param.visit_with(this);
            clause.body.visit_with(this);
        });
    }

    fn visit_for_stmt(&mut self, stmt: &ForStmt) {
        self.with_scope(|this| stmt.visit_children_with(this));
    }

    fn visit_for_in_stmt(&mut self, stmt: &ForInStmt) {
        self.with_scope(|this| stmt.visit_children_with(this));
    }

    fn visit_for_of_stmt(&mut self, stmt: &ForOfStmt) {
        self.with_scope(|this| stmt.visit_children_with(this));
    }

    // for (x of xs) writes to an existing `x`
    fn visit_for_head(&mut self, head: &ForHead) {
        match head {
            ForHead::Pat(pat) => {
                let assigning = mem::replace(&mut self.assigning, true);
                pat.visit_with(self);
                self.assigning = assigning;
            }
            _ => head.visit_children_with(self),
        }
    }

    fn visit_var_declarator(&mut self, declarator: &VarDeclarator) {
        self.bind_all(collect_pat_bindings(&declarator.name));
        let assigning = mem::replace(&mut self.assigning, false);
        declarator.name.visit_with(self);
        declarator.init.visit_with(self);
        self.assigning = assigning;
    }

    fn visit_simple_assign_target(&mut self, target: &SimpleAssignTarget) {
        match target {
            SimpleAssignTarget::Ident(binding) => {
                self.reference(&binding.id);
                binding.type_ann.visit_with(self);
            }
            _ => target.visit_children_with(self),
        }
    }

    fn visit_assign_target_pat(&mut self, pat: &AssignTargetPat) {
        let assigning = mem::replace(&mut self.assigning, true);
        pat.visit_children_with(self);
        self.assigning = assigning;
    }

    fn visit_fn_decl(&mut self, decl: &FnDecl) {
        self.bind(decl.ident.sym.to_string());
        decl.function.visit_with(self);
    }

    fn visit_class_decl(&mut self, decl: &ClassDecl) {
        self.bind(decl.ident.sym.to_string());
        decl.class.visit_with(self);
    }

    fn visit_fn_expr(&mut self, expr: &FnExpr) {
        self.with_scope(|this| {
            if let Some(ident) = &expr.ident {
                this.bind(ident.sym.to_string());
            }
            expr.function.visit_with(this);
        });
    }

    fn visit_class_expr(&mut self, expr: &ClassExpr) {
        self.with_scope(|this| {
            if let Some(ident) = &expr.ident {
                this.bind(ident.sym.to_string());
            }
            expr.class.visit_with(this);
        });
    }

    fn visit_class(&mut self, class: &Class) {
        self.with_scope(|this| {
            class.type_params.visit_with(this);
            class.decorators.visit_with(this);
            class.super_class.visit_with(this);
            class.super_type_params.visit_with(this);
            class.implements.visit_with(this);
            class.body.visit_with(this);
        });
    }

    // labels are not bindings
    fn visit_labeled_stmt(&mut self, stmt: &LabeledStmt) {
        stmt.body.visit_with(self);
    }

    fn visit_break_stmt(&mut self, _: &BreakStmt) {}

    fn visit_continue_stmt(&mut self, _: &ContinueStmt) {}

    fn visit_ts_type_param(&mut self, param: &TsTypeParam) {
        self.bind(param.name.sym.to_string());
        param.constraint.visit_with(self);
        param.default.visit_with(self);
    }

    fn visit_ts_interface_decl(&mut self, decl: &TsInterfaceDecl) {
        self.with_scope(|this| {
            decl.type_params.visit_with(this);
            decl.extends.visit_with(this);
            decl.body.visit_with(this);
        });
    }

    fn visit_ts_type_alias_decl(&mut self, decl: &TsTypeAliasDecl) {
        self.with_scope(|this| {
            decl.type_params.visit_with(this);
            decl.type_ann.visit_with(this);
        });
    }

    fn visit_ts_enum_decl(&mut self, decl: &TsEnumDecl) {
        self.with_scope(|this| {
            for member in &decl.members {
                match &member.id {
                    TsEnumMemberId::Ident(ident) => this.bind(ident.sym.to_string()),
                    TsEnumMemberId::Str(s) => this.bind(s.value.to_string()),
                }
            }
            decl.members.visit_with(this);
        });
    }

    fn visit_ts_enum_member(&mut self, member: &TsEnumMember) {
        member.init.visit_with(self);
    }

    fn visit_ts_module_decl(&mut self, decl: &TsModuleDecl) {
        decl.body.visit_with(self);
    }

    fn visit_ts_namespace_decl(&mut self, decl: &TsNamespaceDecl) {
        decl.body.visit_with(self);
    }

    fn visit_ts_module_block(&mut self, block: &TsModuleBlock) {
        self.with_scope(|this| {
            this.bind_all(collect_module_item_bindings(&block.body));
            block.body.visit_with(this);
        });
    }

    fn visit_ts_fn_type(&mut self, ty: &TsFnType) {
        self.with_scope(|this| {
            ty.type_params.visit_with(this);
            ty.params.visit_with(this);
            ty.type_ann.visit_with(this);
        });
    }

    fn visit_ts_constructor_type(&mut self, ty: &TsConstructorType) {
        self.with_scope(|this| {
            ty.type_params.visit_with(this);
            ty.params.visit_with(this);
            ty.type_ann.visit_with(this);
        });
    }

    fn visit_ts_call_signature_decl(&mut self, decl: &TsCallSignatureDecl) {
        self.with_scope(|this| {
            decl.type_params.visit_with(this);
            decl.params.visit_with(this);
            decl.type_ann.visit_with(this);
        });
    }

    fn visit_ts_construct_signature_decl(&mut self, decl: &TsConstructSignatureDecl) {
        self.with_scope(|this| {
            decl.type_params.visit_with(this);
            decl.params.visit_with(this);
            decl.type_ann.visit_with(this);
        });
    }

    fn visit_ts_method_signature(&mut self, sig: &TsMethodSignature) {
        self.with_scope(|this| {
            if sig.computed {
                sig.key.visit_with(this);
            }
            sig.type_params.visit_with(this);
            sig.params.visit_with(this);
            sig.type_ann.visit_with(this);
        });
    }

    fn visit_ts_property_signature(&mut self, sig: &TsPropertySignature) {
        if sig.computed {
            sig.key.visit_with(self);
        }
        sig.type_ann.visit_with(self);
    }

    fn visit_ts_getter_signature(&mut self, sig: &TsGetterSignature) {
        if sig.computed {
            sig.key.visit_with(self);
        }
        sig.type_ann.visit_with(self);
    }

    fn visit_ts_setter_signature(&mut self, sig: &TsSetterSignature) {
        if sig.computed {
            sig.key.visit_with(self);
        }
        sig.param.visit_with(self);
    }

    fn visit_ts_mapped_type(&mut self, ty: &TsMappedType) {
        self.with_scope(|this| ty.visit_children_with(this));
    }
}

#[cfg(test)]
mod tests {
    use swc_core::ecma::ast::{ModuleDecl, ModuleItem};

    use super::*;
    use crate::utils::test_helper::parse_module_at;

    fn free_names(code: &str) -> Vec<String> {
        free_names_at("/test/input.ts", code)
    }

    fn free_names_at(path: &str, code: &str) -> Vec<String> {
        let module = parse_module_at(path, code);
        let mut names = vec![];
        for item in &module.body {
            let references = match item {
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                    ReferenceCollector::collect(&export.decl)
                }
                _ => ReferenceCollector::collect(item),
            };
            names.extend(references.into_iter().map(|r| r.name));
        }
        names
    }

    #[test]
    fn test_params_are_not_references() {
        assert_eq!(
            free_names("function f(a, { b }, [c], ...d) { return a + b + c + d.length + e; }"),
            vec!["e"]
        );
    }

    #[test]
    fn test_call_callee_and_arguments() {
        assert_eq!(
            free_names("function f() { return helper(x, y(z)); }"),
            vec!["helper", "x", "y", "z"]
        );
    }

    #[test]
    fn test_one_reference_per_occurrence() {
        assert_eq!(free_names("function f() { g(); g(); }"), vec!["g", "g"]);
    }

    #[test]
    fn test_local_bindings_shadow() {
        assert_eq!(
            free_names(
                r#"
function f() {
    const helper = 1;
    let later = () => inner();
    function inner() { return helper; }
    return later;
}
"#
            ),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_block_scope_ends() {
        assert_eq!(
            free_names("function f() { { const x = 1; } return x; }"),
            vec!["x"]
        );
    }

    #[test]
    fn test_var_is_function_scoped() {
        assert_eq!(
            free_names("function f() { if (c) { var x = 1; } return x; }"),
            vec!["c"]
        );
    }

    #[test]
    fn test_member_props_and_object_keys() {
        assert_eq!(
            free_names("function f() { return { key: obj.prop, short }; }"),
            vec!["obj", "short"]
        );
    }

    #[test]
    fn test_labels_and_catch() {
        assert_eq!(
            free_names(
                "function f() { outer: for (const i of list) { try { g(i) } catch (e) { break outer; } } }"
            ),
            vec!["list", "g"]
        );
    }

    #[test]
    fn test_assignment_targets_are_references() {
        assert_eq!(
            free_names("function f() { counter = 1; [a, b] = pair; for (item of items) {} }"),
            vec!["counter", "a", "b", "pair", "item", "items"]
        );
    }

    #[test]
    fn test_arguments_and_named_function_expression() {
        assert_eq!(
            free_names("const f = function self(n) { return n ? self(n - 1) : arguments.length; };"),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_type_parameters_and_type_references() {
        assert_eq!(
            free_names("function id<T extends Base>(value: T): Wrapped<T> { return value; }"),
            vec!["Base", "Wrapped"]
        );
    }

    #[test]
    fn test_interface_members() {
        assert_eq!(
            free_names("interface Shape<K> extends Named { kind: K; area(scale: number): Unit; }"),
            vec!["Named", "Unit"]
        );
    }

    #[test]
    fn test_enum_members_bind_each_other() {
        assert_eq!(
            free_names("enum Flags { A = 1, B = A << 1, C = Other.X }"),
            vec!["Other"]
        );
    }

    #[test]
    fn test_class_members() {
        assert_eq!(
            free_names(
                r#"
class Point extends Base {
    constructor(private x: number, y = origin) { super(); this.y = y; }
    get len() { return measure(this); }
    static make() { return new Point(0); }
}
"#
            ),
            vec!["Base", "origin", "measure"]
        );
    }

    #[test]
    fn test_top_level_statement() {
        assert_eq!(free_names("console.log(render(app));"), vec!["console", "render", "app"]);
    }

    #[test]
    fn test_default_params_do_not_see_body_bindings() {
        assert_eq!(
            free_names("function f(a = x) { var x = 2; return a + x; }"),
            vec!["x"]
        );
        assert_eq!(
            free_names("const g = (a = y) => { let y = 1; return a + y; };"),
            vec!["y"]
        );
        assert_eq!(free_names("function h(a, b = a) { return b; }"), Vec::<String>::new());
        assert_eq!(
            free_names("class C { constructor(a = z) { const z = 0; } m(b = w) { var w; } }"),
            vec!["z", "w"]
        );
    }

    #[test]
    fn test_jsx_intrinsic_tags() {
        assert_eq!(
            free_names_at(
                "/test/input.tsx",
                r#"const App = () => <div className="a"><Widget title={title} /><ui.Panel /></div>;"#
            ),
            vec!["Widget", "title", "ui"]
        );
    }
}
