use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::module::{ModuleIdx, NodeId, Reference, Target};
use crate::module_graph::ModuleGraph;

/// Traversal state of one emission.
#[derive(Debug, Default)]
pub struct EmitContext {
    visited: HashSet<NodeId>,
    roots: HashSet<NodeId>,
    /// Emitted declaration names and the module that first emitted them.
    names: HashMap<String, ModuleIdx>,
    /// Names emitted from more than one module.
    collisions: Vec<String>,
    units: Vec<String>,
}

impl EmitContext {
    pub fn new(roots: &[NodeId]) -> Self {
        Self {
            roots: roots.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn is_visited(&self, node: &NodeId) -> bool {
        self.visited.contains(node)
    }

    pub fn collisions(&self) -> &[String] {
        &self.collisions
    }

    pub fn finish(self) -> String {
        self.units.join("\n")
    }
}

pub struct Emitter<'a> {
    module_graph: &'a ModuleGraph,
}

impl<'a> Emitter<'a> {
    pub fn new(module_graph: &'a ModuleGraph) -> Self {
        Self { module_graph }
    }

    /// Emits every root and everything reachable from it, each node once, in
    /// depth-first first-visit order.
    pub fn emit(&self, roots: &[NodeId]) -> String {
        self.emit_context(roots).finish()
    }

    pub fn emit_context(&self, roots: &[NodeId]) -> EmitContext {
        let mut context = EmitContext::new(roots);
        for root in roots {
            self.emit_node(*root, &mut context);
        }
        debug!("{} units emitted", context.units.len());
        context
    }

    fn emit_node(&self, root: NodeId, context: &mut EmitContext) {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if !context.visited.insert(node) {
                continue;
            }
            let text = self.text(node, context);
            context.units.push(text);

            // reversed so the first edge is visited first
            for reference in self.references(node).iter().rev() {
                if let Some(Target::Declaration(id)) = reference.target {
                    let next = NodeId::Decl(id);
                    if !context.is_visited(&next) {
                        stack.push(next);
                    }
                }
            }
        }
    }

    fn text(&self, node: NodeId, context: &mut EmitContext) -> String {
        match node {
            NodeId::Decl(id) => {
                let decl = self.module_graph.declaration(id);
                match context.names.get(&decl.name) {
                    Some(module) if *module != id.module => {
                        warn!(
                            "declaration \"{}\" is emitted from both {} and {}",
                            decl.name,
                            self.module_graph.module_at(*module).id,
                            self.module_graph.module_at(id.module).id
                        );
                        context.collisions.push(decl.name.clone());
                    }
                    Some(_) => {}
                    None => {
                        context.names.insert(decl.name.clone(), id.module);
                    }
                }
                decl.text(context.roots.contains(&node)).to_string()
            }
            NodeId::Stmt(id) => self.module_graph.statement(id).source_text.clone(),
        }
    }

    fn references(&self, node: NodeId) -> &'a [Reference] {
        match node {
            NodeId::Decl(id) => &self.module_graph.declaration(id).references,
            NodeId::Stmt(id) => &self.module_graph.statement(id).references,
        }
    }
}
