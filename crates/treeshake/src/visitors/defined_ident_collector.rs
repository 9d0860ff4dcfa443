use swc_core::ecma::ast::{
    ArrowExpr, Class, Constructor, Decl, Function, GetterProp, ModuleDecl, ModuleItem,
    ObjectPatProp, Pat, SetterProp, Stmt, TsModuleName, VarDecl, VarDeclKind,
};
use swc_core::ecma::visit::{Visit, VisitWith};

/// Collects the names a binding pattern introduces.
#[derive(Debug, Default)]
pub struct DefinedIdentCollector {
    pub defined_idents: Vec<String>,
}

impl DefinedIdentCollector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Visit for DefinedIdentCollector {
    fn visit_pat(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(bi) => {
                self.defined_idents.push(bi.id.sym.to_string());
            }
            // const [x, y] = [1, 2];
            Pat::Array(array_pat) => {
                for elem in array_pat.elems.iter().flatten() {
                    self.visit_pat(elem);
                }
            }
            // const [x, ...rest] = [1, 2, 3, 4];
            Pat::Rest(rest_pat) => {
                self.visit_pat(&rest_pat.arg);
            }
            // const { x, y: z } = { x: 1, y: 2 };
            Pat::Object(obj_pat) => {
                for prop in &obj_pat.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv_prop) => {
                            self.visit_pat(&kv_prop.value);
                        }
                        ObjectPatProp::Assign(assign_prop) => {
                            self.defined_idents.push(assign_prop.key.id.sym.to_string());
                        }
                        ObjectPatProp::Rest(rest_prop) => {
                            self.visit_pat(&rest_prop.arg);
                        }
                    }
                }
            }
            // function f(x = 1) {}
            Pat::Assign(assign_pat) => {
                self.visit_pat(&assign_pat.left);
            }
            Pat::Invalid(_) | Pat::Expr(_) => {}
        }
    }
}

pub fn collect_pat_bindings(pat: &Pat) -> Vec<String> {
    let mut collector = DefinedIdentCollector::new();
    collector.visit_pat(pat);
    collector.defined_idents
}

pub fn collect_decl_bindings(decl: &Decl, out: &mut Vec<String>) {
    match decl {
        Decl::Fn(fn_decl) => out.push(fn_decl.ident.sym.to_string()),
        Decl::Class(class_decl) => out.push(class_decl.ident.sym.to_string()),
        Decl::Var(var_decl) => {
            for decl in &var_decl.decls {
                out.extend(collect_pat_bindings(&decl.name));
            }
        }
        Decl::Using(using_decl) => {
            for decl in &using_decl.decls {
                out.extend(collect_pat_bindings(&decl.name));
            }
        }
        Decl::TsInterface(decl) => out.push(decl.id.sym.to_string()),
        Decl::TsTypeAlias(decl) => out.push(decl.id.sym.to_string()),
        Decl::TsEnum(decl) => out.push(decl.id.sym.to_string()),
        Decl::TsModule(decl) => {
            if let TsModuleName::Ident(id) = &decl.id {
                out.push(id.sym.to_string());
            }
        }
    }
}

/// Names declared directly in a statement list (block-scoped and function declarations).
pub fn collect_block_bindings(stmts: &[Stmt]) -> Vec<String> {
    let mut out = vec![];
    for stmt in stmts {
        if let Stmt::Decl(decl) = stmt {
            collect_decl_bindings(decl, &mut out);
        }
    }
    out
}

/// Names declared directly in a namespace body.
pub fn collect_module_item_bindings(items: &[ModuleItem]) -> Vec<String> {
    let mut out = vec![];
    for item in items {
        match item {
            ModuleItem::Stmt(Stmt::Decl(decl)) => collect_decl_bindings(decl, &mut out),
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                collect_decl_bindings(&export.decl, &mut out)
            }
            _ => {}
        }
    }
    out
}

/// Collects `var` names of a function body, which are hoisted to the function scope.
/// Does not descend into nested functions or classes.
#[derive(Debug, Default)]
pub struct VarDeclCollector {
    pub defined_idents: Vec<String>,
}

impl VarDeclCollector {
    pub fn collect(stmts: &[Stmt]) -> Vec<String> {
        let mut collector = Self::default();
        for stmt in stmts {
            stmt.visit_with(&mut collector);
        }
        collector.defined_idents
    }
}

impl Visit for VarDeclCollector {
    fn visit_var_decl(&mut self, var_decl: &VarDecl) {
        if var_decl.kind == VarDeclKind::Var {
            for decl in &var_decl.decls {
                self.defined_idents.extend(collect_pat_bindings(&decl.name));
            }
        }
    }

    fn visit_function(&mut self, _: &Function) {}

    fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}

    fn visit_class(&mut self, _: &Class) {}

    fn visit_constructor(&mut self, _: &Constructor) {}

    fn visit_getter_prop(&mut self, _: &GetterProp) {}

    fn visit_setter_prop(&mut self, _: &SetterProp) {}
}
