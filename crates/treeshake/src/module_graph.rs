use std::collections::{HashMap, HashSet};

use petgraph::prelude::EdgeRef;
use petgraph::stable_graph::StableDiGraph;
use petgraph::Direction;

use crate::module::{
    DeclId, Declaration, Dependency, Module, ModuleId, ModuleIdx, Statement, StmtId,
};

/// Arena of compiled modules. Modules are addressed by id (their normalized path)
/// or by graph index; declarations and statements by `DeclId` / `StmtId`.
#[derive(Debug)]
pub struct ModuleGraph {
    id_index_map: HashMap<ModuleId, ModuleIdx>,
    pub graph: StableDiGraph<Module, Dependency>,
    entry: Option<ModuleId>,
}

impl Default for ModuleGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self {
            id_index_map: HashMap::new(),
            graph: StableDiGraph::new(),
            entry: None,
        }
    }

    pub fn add_module(&mut self, module: Module) -> ModuleIdx {
        let id = module.id.clone();
        if module.is_entry {
            self.entry = Some(id.clone());
        }
        let idx = self.graph.add_node(module);
        self.id_index_map.insert(id, idx);
        idx
    }

    pub fn get_entry_module(&self) -> Option<&Module> {
        self.entry.as_ref().and_then(|id| self.get_module(id))
    }

    pub fn get_module(&self, module_id: &ModuleId) -> Option<&Module> {
        self.id_index_map
            .get(module_id)
            .and_then(|i| self.graph.node_weight(*i))
    }

    pub fn index_of(&self, module_id: &ModuleId) -> Option<ModuleIdx> {
        self.id_index_map.get(module_id).copied()
    }

    pub fn module_at(&self, idx: ModuleIdx) -> &Module {
        &self.graph[idx]
    }

    pub fn module_at_mut(&mut self, idx: ModuleIdx) -> &mut Module {
        &mut self.graph[idx]
    }

    pub fn get_modules(&self) -> Vec<&Module> {
        self.graph.node_weights().collect()
    }

    /// Module indices sorted by module id, the order every whole-graph pass uses.
    pub fn sorted_indices(&self) -> Vec<ModuleIdx> {
        let mut indices = self.graph.node_indices().collect::<Vec<_>>();
        indices.sort_by(|a, b| self.graph[*a].id.cmp(&self.graph[*b].id));
        indices
    }

    /// One edge per module pair; a repeated import keeps the first edge and its order.
    pub fn add_dependency(&mut self, from: &ModuleId, to: &ModuleId, edge: Dependency) {
        let from = self
            .id_index_map
            .get(from)
            .unwrap_or_else(|| panic!(r#"from node "{}" does not exist in the module graph"#, from));
        let to = self
            .id_index_map
            .get(to)
            .unwrap_or_else(|| panic!(r#"to node "{}" does not exist in the module graph"#, to));
        if self.graph.find_edge(*from, *to).is_none() {
            self.graph.add_edge(*from, *to, edge);
        }
    }

    /// Imported modules in import source order.
    pub fn get_dependencies(&self, module_id: &ModuleId) -> Vec<(&ModuleId, &Dependency)> {
        let Some(idx) = self.index_of(module_id) else {
            return vec![];
        };
        let mut deps = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| (&self.graph[edge.target()].id, edge.weight()))
            .collect::<Vec<_>>();
        deps.sort_by_key(|(_, dep)| dep.order);
        deps
    }

    pub fn declaration(&self, id: DeclId) -> &Declaration {
        &self.graph[id.module].declarations[id.index]
    }

    pub fn statement(&self, id: StmtId) -> &Statement {
        &self.graph[id.module].statements[id.index]
    }

    /// `path#name`, used in logs and test assertions.
    pub fn describe(&self, id: DeclId) -> String {
        let module = &self.graph[id.module];
        let (name, _) = module
            .declarations
            .get_index(id.index)
            .unwrap_or_else(|| panic!("declaration {:?} not found in {}", id, module.id));
        format!("{}#{}", module.id, name)
    }

    /// Modules in evaluation order: imports before importers, in import source order,
    /// starting from the entry. Cycles are cut at the first revisit.
    pub fn evaluation_order(&self) -> Vec<ModuleIdx> {
        let mut order = vec![];
        let Some(entry) = &self.entry else {
            return order;
        };
        let Some(entry_idx) = self.index_of(entry) else {
            return order;
        };

        let mut visited = HashSet::new();
        // (module, next dependency to look at)
        let mut stack = vec![(entry_idx, 0usize)];
        visited.insert(entry_idx);
        while let Some((idx, next)) = stack.pop() {
            let deps = self.get_dependencies(&self.graph[idx].id);
            if let Some((dep, _)) = deps.get(next) {
                stack.push((idx, next + 1));
                if let Some(dep_idx) = self.index_of(dep) {
                    if visited.insert(dep_idx) {
                        stack.push((dep_idx, 0));
                    }
                }
            } else {
                order.push(idx);
            }
        }
        order
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}
