//! Circular dependency detection for formula cells.
//!
//! When a formula is entered, we must verify it doesn't create a cycle
//! (e.g., A1 references B1, B1 references C1, C1 references A1).
//! The walk is an explicit-stack depth-first search so long dependency
//! chains cannot overflow the call stack.

use std::collections::HashSet;

use super::{CellRef, Grid};

/// Detect circular dependencies starting from a cell.
/// Returns Some(cycle_path) if a cycle is found, ending with the repeated
/// cell; None otherwise.
pub fn detect_cycle(start: &CellRef, grid: &Grid) -> Option<Vec<CellRef>> {
    // Each frame is a cell on the current path plus its remaining deps.
    let mut frames: Vec<(CellRef, Vec<CellRef>)> = vec![(start.clone(), deps_of(start, grid))];
    let mut on_path: HashSet<CellRef> = HashSet::from([start.clone()]);
    let mut finished: HashSet<CellRef> = HashSet::new();

    while let Some((_, pending)) = frames.last_mut() {
        let Some(next) = pending.pop() else {
            if let Some((done, _)) = frames.pop() {
                on_path.remove(&done);
                finished.insert(done);
            }
            continue;
        };

        if on_path.contains(&next) {
            let mut path: Vec<CellRef> = frames.into_iter().map(|(cell, _)| cell).collect();
            path.push(next);
            return Some(path);
        }
        if finished.contains(&next) {
            continue;
        }

        let deps = deps_of(&next, grid);
        on_path.insert(next.clone());
        frames.push((next, deps));
    }

    None
}

fn deps_of(cell: &CellRef, grid: &Grid) -> Vec<CellRef> {
    match grid.get(cell) {
        Some(entry) => entry.depends_on.iter().rev().cloned().collect(),
        None => Vec::new(),
    }
}
