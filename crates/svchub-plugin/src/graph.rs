//! Plugin load-order resolution.
//!
//! Depth-first traversal with three-coloring (unvisited, in-progress,
//! done). Dependencies are visited before their dependents; revisiting
//! an in-progress name means the declarations contain a cycle, which
//! fails the whole computation rather than silently dropping an edge.

use std::collections::HashMap;

use crate::error::PluginError;

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    InProgress,
    Done,
}

/// Resolves a dependency-respecting load order for `requested`.
///
/// Every requested name appears in the output exactly once, with each
/// dependency placed before its dependent. Dependencies pointing
/// outside the requested set (disabled plugins) are ignored rather
/// than treated as errors. Ties between independent plugins are broken
/// by first-encounter order over `requested`, so the result is stable
/// for a given input.
pub fn resolve_load_order(
    requested: &[String],
    dependencies: &HashMap<String, Vec<String>>,
) -> Result<Vec<String>, PluginError> {
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut order = Vec::with_capacity(requested.len());

    for name in requested {
        visit(name, requested, dependencies, &mut marks, &mut order)?;
    }

    Ok(order)
}

fn visit<'a>(
    name: &'a str,
    requested: &'a [String],
    dependencies: &'a HashMap<String, Vec<String>>,
    marks: &mut HashMap<&'a str, Mark>,
    order: &mut Vec<String>,
) -> Result<(), PluginError> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
            return Err(PluginError::DependencyCycle {
                plugin: name.to_string(),
            });
        }
        None => {}
    }

    marks.insert(name, Mark::InProgress);

    if let Some(deps) = dependencies.get(name) {
        for dep in deps {
            if requested.iter().any(|r| r == dep) {
                visit(dep, requested, dependencies, marks, order)?;
            }
        }
    }

    marks.insert(name, Mark::Done);
    order.push(name.to_string());
    Ok(())
}
