use anyhow::{anyhow, Result};
use swc_core::common::{BytePos, Span, Spanned};
use swc_core::ecma::ast::{
    Decl, Decorator, DefaultDecl, ExportSpecifier, ImportDecl, ImportSpecifier, ModuleDecl, ModuleExportName,
    ModuleItem as AstItem, NamedExport, Pat, Stmt, TsModuleName,
};
use tracing::debug;

use crate::ast::file::File;
use crate::ast::js_ast::JsAst;
use crate::build::resolve::resolve;
use crate::config::Config;
use crate::error::ShakeError;
use crate::module::{
    Declaration, Import, ImportBinding, Module, ModuleId, ModuleItem, ReExport, Reference,
    Statement,
};
use crate::visitors::pure_checker::PureChecker;
use crate::visitors::reference_collector::ReferenceCollector;

/// Extracts declarations, imports, re-exports and top-level statements of one source unit.
pub fn compile_module(file: &File, ast: &JsAst, config: &Config) -> Result<Module> {
    let mut compiler = ModuleCompiler {
        file,
        ast,
        config,
        checker: PureChecker::new(Some(&ast.comments)),
        module: Module::new(ModuleId::from(file.path.clone()), file.is_entry),
        local_exports: vec![],
    };
    for item in &ast.ast.body {
        compiler.compile_item(item)?;
    }
    compiler.apply_local_exports()?;

    let mut module = compiler.module;
    if !module.is_entry {
        for decl in module.declarations.values_mut() {
            decl.exported = false;
        }
    }
    debug!(
        "compiled {}: {} declarations, {} statements, {} imports",
        module.id,
        module.declarations.len(),
        module.statements.len(),
        module.imports.len()
    );
    Ok(module)
}

struct ModuleCompiler<'a> {
    file: &'a File,
    ast: &'a JsAst,
    config: &'a Config,
    checker: PureChecker<'a>,
    module: Module,
    /// `export { name }` entries: item position, name, span.
    local_exports: Vec<(usize, String, Span)>,
}

impl<'a> ModuleCompiler<'a> {
    fn compile_item(&mut self, item: &AstItem) -> Result<()> {
        match item {
            AstItem::ModuleDecl(module_decl) => match module_decl {
                ModuleDecl::Import(import) => self.compile_import(import),
                ModuleDecl::ExportDecl(export) => {
                    let decorators: &[Decorator] = match &export.decl {
                        Decl::Class(class_decl) => &class_decl.class.decorators[..],
                        _ => &[],
                    };
                    let span = with_decorators(export.span, decorators);
                    self.add_declaration(&export.decl, span, export.span.lo, true)
                }
                ModuleDecl::ExportNamed(named) => match &named.src {
                    Some(src) => self.compile_re_export(named, &src.value),
                    None => self.compile_export_list(named),
                },
                ModuleDecl::ExportDefaultDecl(export) => {
                    let (name, ambient, references) = match &export.decl {
                        DefaultDecl::Fn(fn_expr) => (
                            fn_expr.ident.as_ref().map(|id| id.sym.to_string()),
                            fn_expr.function.body.is_none(),
                            ReferenceCollector::collect(fn_expr),
                        ),
                        DefaultDecl::Class(class_expr) => (
                            class_expr.ident.as_ref().map(|id| id.sym.to_string()),
                            false,
                            ReferenceCollector::collect(class_expr),
                        ),
                        DefaultDecl::TsInterfaceDecl(interface) => (
                            Some(interface.id.sym.to_string()),
                            interface.declare,
                            ReferenceCollector::collect(&**interface),
                        ),
                    };
                    let decorators: &[Decorator] = match &export.decl {
                        DefaultDecl::Class(class_expr) => &class_expr.class.decorators[..],
                        _ => &[],
                    };
                    let name = name.unwrap_or_else(|| "default".to_string());
                    let references = if ambient { vec![] } else { references };
                    let span = with_decorators(export.span, decorators);
                    self.insert_declaration(name, span, export.span.lo, true, references)
                }
                ModuleDecl::ExportDefaultExpr(export) => {
                    let references = ReferenceCollector::collect(&*export.expr);
                    self.insert_declaration(
                        "default".to_string(),
                        export.span,
                        export.span.lo,
                        true,
                        references,
                    )
                }
                ModuleDecl::ExportAll(export) => {
                    Err(self.shape_error(export.span, "`export *` is not supported"))
                }
                ModuleDecl::TsImportEquals(decl) => {
                    Err(self.shape_error(decl.span, "`import x = require()` is not supported"))
                }
                ModuleDecl::TsExportAssignment(decl) => {
                    Err(self.shape_error(decl.span, "`export =` is not supported"))
                }
                ModuleDecl::TsNamespaceExport(decl) => {
                    Err(self.shape_error(decl.span, "`export as namespace` is not supported"))
                }
            },
            AstItem::Stmt(Stmt::Decl(decl)) => {
                self.add_declaration(decl, decl.span(), decl.span_lo(), false)
            }
            AstItem::Stmt(stmt) => self.add_statement(stmt),
        }
    }

    fn compile_import(&mut self, import: &ImportDecl) -> Result<()> {
        let specifier = import.src.value.to_string();
        if import.specifiers.is_empty() {
            return Err(self.shape_error(
                import.span,
                &format!("import of \"{}\" has no named bindings", specifier),
            ));
        }
        let target = ModuleId::from(resolve(&self.file.path, &specifier, self.config)?);

        for spec in &import.specifiers {
            let named = match spec {
                ImportSpecifier::Named(named) => named,
                ImportSpecifier::Default(default) => {
                    return Err(self.shape_error(default.span, "default imports are not supported"))
                }
                ImportSpecifier::Namespace(namespace) => {
                    return Err(
                        self.shape_error(namespace.span, "namespace imports are not supported")
                    )
                }
            };
            let local = named.local.sym.to_string();
            let imported = named
                .imported
                .as_ref()
                .map(export_name)
                .unwrap_or_else(|| local.clone());
            self.check_unique(&local)?;
            self.module.import_table.insert(
                local.clone(),
                ImportBinding {
                    local: local.clone(),
                    imported: imported.clone(),
                    target: target.clone(),
                },
            );
        }
        self.module.imports.push(Import {
            source: specifier,
            target,
        });
        Ok(())
    }

    fn compile_re_export(&mut self, named: &NamedExport, specifier: &str) -> Result<()> {
        let target = ModuleId::from(resolve(&self.file.path, specifier, self.config)?);
        for spec in &named.specifiers {
            let ExportSpecifier::Named(spec) = spec else {
                return Err(self.shape_error(
                    named.span,
                    "only named re-exports are supported",
                ));
            };
            let original = export_name(&spec.orig);
            let exported = spec
                .exported
                .as_ref()
                .map(export_name)
                .unwrap_or_else(|| original.clone());
            if self.module.re_exports.contains_key(&exported)
                || self.module.declarations.contains_key(&exported)
            {
                return Err(self.duplicate(&exported));
            }
            self.module.re_exports.insert(
                exported.clone(),
                ReExport {
                    exported: exported.clone(),
                    original: original.clone(),
                    target: target.clone(),
                },
            );
            self.module.items.push(ModuleItem::ReExport(exported));
        }
        self.module.imports.push(Import {
            source: specifier.to_string(),
            target,
        });
        Ok(())
    }

    fn compile_export_list(&mut self, named: &NamedExport) -> Result<()> {
        for spec in &named.specifiers {
            let ExportSpecifier::Named(spec) = spec else {
                return Err(self.shape_error(named.span, "only named exports are supported"));
            };
            let local = export_name(&spec.orig);
            if let Some(exported) = spec.exported.as_ref().map(export_name) {
                if exported != local {
                    return Err(anyhow!(ShakeError::AliasMismatch {
                        local,
                        imported: exported,
                        module: self.path(),
                    }));
                }
            }
            self.local_exports
                .push((self.module.items.len(), local, spec.span));
        }
        Ok(())
    }

    /// Marks listed declarations exported. Listed imports become re-exports at the
    /// position of their export list.
    fn apply_local_exports(&mut self) -> Result<()> {
        let exports = std::mem::take(&mut self.local_exports);
        let mut inserted = 0;
        for (position, name, span) in exports {
            if let Some(decl) = self.module.declarations.get_mut(&name) {
                decl.exported = true;
            } else if let Some(binding) = self.module.import_table.get(&name) {
                if self.module.re_exports.contains_key(&name) {
                    continue;
                }
                let re_export = ReExport {
                    exported: name.clone(),
                    original: binding.imported.clone(),
                    target: binding.target.clone(),
                };
                self.module.re_exports.insert(name.clone(), re_export);
                self.module
                    .items
                    .insert(position + inserted, ModuleItem::ReExport(name));
                inserted += 1;
            } else {
                debug!("{}", self.ast.code_frame(span, "exported name is not declared"));
                return Err(anyhow!(ShakeError::UnresolvedSymbol {
                    name,
                    module: self.path(),
                }));
            }
        }
        Ok(())
    }

    /// `item_span` covers the whole top-level item; `export_lo` is where its
    /// `export` keyword would start.
    fn add_declaration(
        &mut self,
        decl: &Decl,
        item_span: Span,
        export_lo: BytePos,
        exported: bool,
    ) -> Result<()> {
        let (name, ambient) = match decl {
            Decl::Fn(fn_decl) => (
                fn_decl.ident.sym.to_string(),
                fn_decl.declare || fn_decl.function.body.is_none(),
            ),
            Decl::Class(class_decl) => (class_decl.ident.sym.to_string(), class_decl.declare),
            Decl::Var(var_decl) => {
                if var_decl.decls.len() != 1 {
                    return Err(self.shape_error(
                        var_decl.span,
                        "variable statements must declare exactly one binding",
                    ));
                }
                let Pat::Ident(binding) = &var_decl.decls[0].name else {
                    return Err(self.shape_error(
                        var_decl.span,
                        "destructuring declarations are not supported",
                    ));
                };
                (binding.id.sym.to_string(), var_decl.declare)
            }
            Decl::Using(using_decl) => {
                return Err(self.shape_error(using_decl.span, "`using` declarations are not supported"))
            }
            Decl::TsInterface(interface) => (interface.id.sym.to_string(), interface.declare),
            Decl::TsTypeAlias(alias) => (alias.id.sym.to_string(), alias.declare),
            Decl::TsEnum(enum_decl) => (enum_decl.id.sym.to_string(), enum_decl.declare),
            Decl::TsModule(module_decl) => match &module_decl.id {
                TsModuleName::Ident(id) => (id.sym.to_string(), module_decl.declare),
                TsModuleName::Str(_) => {
                    return Err(self.shape_error(
                        module_decl.span,
                        "string-named module declarations are not supported",
                    ))
                }
            },
        };
        let references = if ambient {
            vec![]
        } else {
            ReferenceCollector::collect(decl)
        };
        self.insert_declaration(name, item_span, export_lo, exported, references)
    }

    fn insert_declaration(
        &mut self,
        name: String,
        span: Span,
        export_lo: BytePos,
        exported: bool,
        references: Vec<Reference>,
    ) -> Result<()> {
        self.check_unique(&name)?;
        if self.module.re_exports.contains_key(&name) {
            return Err(self.duplicate(&name));
        }
        let source_text = self.ast.snippet(span)?;
        let decl_text = if export_lo > span.lo {
            // decorators written before `export` stay in front of the class
            let decorators = self.ast.snippet(span.with_hi(export_lo))?;
            let rest = self.ast.snippet(span.with_lo(export_lo))?;
            format!("{}{}", decorators, strip_export(&rest))
        } else {
            strip_export(&source_text).to_string()
        };
        let (index, _) = self.module.declarations.insert_full(
            name.clone(),
            Declaration {
                name,
                source_text,
                decl_text,
                exported,
                references,
            },
        );
        self.module.items.push(ModuleItem::Declaration(index));
        Ok(())
    }

    fn add_statement(&mut self, stmt: &Stmt) -> Result<()> {
        let span = stmt.span();
        let statement = Statement {
            source_text: self.ast.snippet(span)?,
            pure: self.checker.is_pure_stmt(stmt),
            references: ReferenceCollector::collect(stmt),
        };
        self.module.statements.push(statement);
        self.module
            .items
            .push(ModuleItem::Statement(self.module.statements.len() - 1));
        Ok(())
    }

    fn check_unique(&self, name: &str) -> Result<()> {
        if self.module.declarations.contains_key(name) || self.module.import_table.contains_key(name)
        {
            return Err(self.duplicate(name));
        }
        Ok(())
    }

    fn duplicate(&self, name: &str) -> anyhow::Error {
        anyhow!(ShakeError::DuplicateDeclaration {
            name: name.to_string(),
            module: self.path(),
        })
    }

    fn shape_error(&self, span: Span, message: &str) -> anyhow::Error {
        anyhow!(ShakeError::ParseShape {
            path: self.path(),
            message: self.ast.code_frame(span, message),
        })
    }

    fn path(&self) -> String {
        self.file.path_str()
    }
}

/// Widens an export item span to decorators written before its `export` keyword.
fn with_decorators(span: Span, decorators: &[Decorator]) -> Span {
    match decorators.first() {
        Some(first) if first.span.lo < span.lo => span.with_lo(first.span.lo),
        _ => span,
    }
}

fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(s) => s.value.to_string(),
    }
}

/// Declaration text without its leading `export` / `export default`.
fn strip_export(source: &str) -> &str {
    let Some(rest) = source.strip_prefix("export") else {
        return source;
    };
    if !rest.starts_with(char::is_whitespace) {
        return source;
    }
    let rest = rest.trim_start();
    match rest.strip_prefix("default") {
        Some(after) if after.starts_with(char::is_whitespace) => after.trim_start(),
        _ => rest,
    }
}
