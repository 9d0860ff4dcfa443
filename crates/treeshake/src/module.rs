use std::fmt::{self, Debug, Formatter};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use petgraph::graph::NodeIndex;

/// Index of a module inside the module graph arena.
pub type ModuleIdx = NodeIndex;

#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ModuleId {
    pub id: String,
}

impl ModuleId {
    pub fn path(&self) -> &Path {
        Path::new(&self.id)
    }
}

impl From<PathBuf> for ModuleId {
    fn from(path: PathBuf) -> Self {
        Self {
            id: path.to_string_lossy().to_string(),
        }
    }
}

impl From<&str> for ModuleId {
    fn from(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl Debug for ModuleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({})", self.id)
    }
}

/// Edge of the module graph, one per imported module. `order` is the position of
/// the first import or re-export clause naming it.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub source: String,
    pub order: usize,
}

/// Arena key of a declaration: the owning module and its position in the declaration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclId {
    pub module: ModuleIdx,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StmtId {
    pub module: ModuleIdx,
    pub index: usize,
}

/// Identity of anything the emitter can output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Decl(DeclId),
    Stmt(StmtId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Declaration(DeclId),
    /// Provided by the runtime, nothing to emit.
    Global,
}

/// An outgoing edge to a free identifier. `target` is filled in by the linker.
#[derive(Debug, Clone)]
pub struct Reference {
    pub name: String,
    pub target: Option<Target>,
}

impl Reference {
    pub fn new(name: String) -> Self {
        Self { name, target: None }
    }

    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    /// Source text of the whole top-level item, leading decorators and `export` included.
    pub source_text: String,
    /// Source text of the declaration without `export` / `export default`.
    pub decl_text: String,
    pub exported: bool,
    /// Empty for `declare`d and bodiless declarations.
    pub references: Vec<Reference>,
}

impl Declaration {
    pub fn text(&self, as_root: bool) -> &str {
        if self.exported || as_root {
            &self.source_text
        } else {
            &self.decl_text
        }
    }
}

#[derive(Debug, Clone)]
pub struct Statement {
    pub source_text: String,
    pub pure: bool,
    pub references: Vec<Reference>,
}

/// `import { local } from 'source'` or `import { imported as local } from 'source'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub local: String,
    pub imported: String,
    pub target: ModuleId,
}

impl ImportBinding {
    pub fn is_aliased(&self) -> bool {
        self.local != self.imported
    }
}

#[derive(Debug, Clone)]
pub struct Import {
    pub source: String,
    pub target: ModuleId,
}

/// `export { original as exported } from 'source'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReExport {
    pub exported: String,
    pub original: String,
    pub target: ModuleId,
}

impl ReExport {
    pub fn is_aliased(&self) -> bool {
        self.exported != self.original
    }
}

/// Top-level items in encounter order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleItem {
    Declaration(usize),
    Statement(usize),
    ReExport(String),
}

pub struct Module {
    pub id: ModuleId,
    pub is_entry: bool,
    pub declarations: IndexMap<String, Declaration>,
    pub imports: Vec<Import>,
    pub import_table: IndexMap<String, ImportBinding>,
    pub re_exports: IndexMap<String, ReExport>,
    pub statements: Vec<Statement>,
    pub items: Vec<ModuleItem>,
}

impl Module {
    pub fn new(id: ModuleId, is_entry: bool) -> Self {
        Self {
            id,
            is_entry,
            declarations: IndexMap::new(),
            imports: vec![],
            import_table: IndexMap::new(),
            re_exports: IndexMap::new(),
            statements: vec![],
            items: vec![],
        }
    }

    pub fn declaration(&self, name: &str) -> Option<(usize, &Declaration)> {
        self.declarations
            .get_full(name)
            .map(|(index, _, decl)| (index, decl))
    }

    /// Every edge of the module, declarations first then statements.
    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.declarations
            .values()
            .flat_map(|decl| decl.references.iter())
            .chain(self.statements.iter().flat_map(|stmt| stmt.references.iter()))
    }

    pub fn is_linked(&self) -> bool {
        self.references().all(Reference::is_resolved)
    }
}

impl Debug for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Module id={} declarations={:?} statements={}",
            self.id.id,
            self.declarations.keys().collect::<Vec<_>>(),
            self.statements.len()
        )
    }
}
