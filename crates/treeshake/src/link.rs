use std::collections::HashSet;
use std::time::Instant;

use anyhow::{anyhow, Result};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ShakeError;
use crate::module::{DeclId, ModuleId, ModuleIdx, ModuleItem, NodeId, StmtId, Target};
use crate::module_graph::ModuleGraph;
use crate::utils::thread_pool;

/// Resolves every reference of every module. Targets are computed per module in
/// parallel against the unchanged graph, then written back in one pass; on error
/// the graph is left untouched and the first failure in module id order is returned.
pub fn link(module_graph: &mut ModuleGraph, config: &Config) -> Result<()> {
    let t_link = Instant::now();
    let globals = config.global_names();
    let indices = module_graph.sorted_indices();

    let resolved = {
        let graph = &*module_graph;
        thread_pool::install(|| {
            indices
                .par_iter()
                .map(|idx| resolve_module(graph, *idx, &globals))
                .collect::<Vec<_>>()
        })
    };
    let mut assignments = Vec::with_capacity(indices.len());
    for (idx, targets) in indices.iter().zip(resolved) {
        assignments.push((*idx, targets?));
    }

    let mut count = 0;
    for (idx, targets) in assignments {
        let module = module_graph.module_at_mut(idx);
        let references = module
            .declarations
            .values_mut()
            .flat_map(|decl| decl.references.iter_mut())
            .chain(
                module
                    .statements
                    .iter_mut()
                    .flat_map(|stmt| stmt.references.iter_mut()),
            );
        for (reference, target) in references.zip(targets) {
            reference.target = Some(target);
            count += 1;
        }
    }
    info!(
        "{} references linked in {}ms",
        count,
        t_link.elapsed().as_millis()
    );
    Ok(())
}

fn resolve_module(
    module_graph: &ModuleGraph,
    idx: ModuleIdx,
    globals: &HashSet<String>,
) -> Result<Vec<Target>> {
    let module = module_graph.module_at(idx);
    module
        .references()
        .map(|reference| resolve_name(module_graph, idx, &reference.name, globals))
        .collect()
}

/// Own declarations, then imports, then ambient globals.
pub fn resolve_name(
    module_graph: &ModuleGraph,
    idx: ModuleIdx,
    name: &str,
    globals: &HashSet<String>,
) -> Result<Target> {
    let module = module_graph.module_at(idx);
    if let Some((index, _)) = module.declaration(name) {
        return Ok(Target::Declaration(DeclId { module: idx, index }));
    }
    if let Some(binding) = module.import_table.get(name) {
        if binding.is_aliased() {
            return Err(anyhow!(ShakeError::AliasMismatch {
                local: binding.local.clone(),
                imported: binding.imported.clone(),
                module: module.id.id.clone(),
            }));
        }
        return resolve_export(module_graph, &binding.target, &binding.imported)
            .map(Target::Declaration);
    }
    if globals.contains(name) {
        return Ok(Target::Global);
    }
    Err(anyhow!(ShakeError::UnresolvedSymbol {
        name: name.to_string(),
        module: module.id.id.clone(),
    }))
}

/// Finds the declaration `name` denotes in `target`, following re-exports.
pub fn resolve_export(module_graph: &ModuleGraph, target: &ModuleId, name: &str) -> Result<DeclId> {
    let mut target = target.clone();
    let mut name = name.to_string();
    let mut seen = HashSet::new();
    loop {
        let unresolved = || {
            anyhow!(ShakeError::UnresolvedSymbol {
                name: name.clone(),
                module: target.id.clone(),
            })
        };
        let Some(idx) = module_graph.index_of(&target) else {
            return Err(unresolved());
        };
        let module = module_graph.module_at(idx);
        if let Some((index, _)) = module.declaration(&name) {
            return Ok(DeclId { module: idx, index });
        }
        let Some(re_export) = module.re_exports.get(&name) else {
            return Err(unresolved());
        };
        if re_export.is_aliased() {
            return Err(anyhow!(ShakeError::AliasMismatch {
                local: re_export.exported.clone(),
                imported: re_export.original.clone(),
                module: module.id.id.clone(),
            }));
        }
        // re-export cycle
        if !seen.insert((target.clone(), name.clone())) {
            return Err(unresolved());
        }
        debug!("follow re-export {}#{} -> {}", target, name, re_export.target);
        name = re_export.original.clone();
        target = re_export.target.clone();
    }
}

/// Starting points of emission: effectful statements of the entry's dependencies in
/// evaluation order, then the entry's exported declarations, re-exported symbols and
/// effectful statements in encounter order.
pub fn collect_roots(module_graph: &ModuleGraph) -> Result<Vec<NodeId>> {
    let mut roots = vec![];
    let Some(entry) = module_graph.get_entry_module() else {
        return Ok(roots);
    };
    let entry_idx = module_graph.index_of(&entry.id);

    for idx in module_graph.evaluation_order() {
        if Some(idx) == entry_idx {
            continue;
        }
        let module = module_graph.module_at(idx);
        roots.extend(
            module
                .statements
                .iter()
                .enumerate()
                .filter(|(_, stmt)| !stmt.pure)
                .map(|(index, _)| NodeId::Stmt(StmtId { module: idx, index })),
        );
    }

    let Some(entry_idx) = entry_idx else {
        return Ok(roots);
    };
    for item in &entry.items {
        match item {
            ModuleItem::Declaration(index) => {
                if entry.declarations[*index].exported {
                    roots.push(NodeId::Decl(DeclId {
                        module: entry_idx,
                        index: *index,
                    }));
                }
            }
            ModuleItem::Statement(index) => {
                if !entry.statements[*index].pure {
                    roots.push(NodeId::Stmt(StmtId {
                        module: entry_idx,
                        index: *index,
                    }));
                }
            }
            ModuleItem::ReExport(name) => {
                let Some(re_export) = entry.re_exports.get(name) else {
                    continue;
                };
                if re_export.is_aliased() {
                    return Err(anyhow!(ShakeError::AliasMismatch {
                        local: re_export.exported.clone(),
                        imported: re_export.original.clone(),
                        module: entry.id.id.clone(),
                    }));
                }
                let decl = resolve_export(module_graph, &re_export.target, &re_export.original)?;
                roots.push(NodeId::Decl(decl));
            }
        }
    }
    debug!("{} root units", roots.len());
    Ok(roots)
}
