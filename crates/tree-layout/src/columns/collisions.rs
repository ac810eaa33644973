use super::Arena;
use petgraph::visit::Dfs;
use std::cmp::Ordering;
use tracing::trace;

/// Push same-column nodes apart until each one clears the previous one by
/// `min_gap`.
///
/// Levels are handled from the roots outwards. A node that has to move
/// drags its whole subtree along, which only touches deeper levels that
/// haven't been processed yet.
pub(crate) fn resolve_collisions(arena: &mut Arena<'_>, min_gap: f32) {
    for level in 0..arena.levels.len() {
        let mut sorted = arena.levels[level].clone();
        // Ties keep pre-order so the result doesn't depend on the sort
        sorted.sort_by(|&a, &b| {
            arena.slots[a]
                .y
                .partial_cmp(&arena.slots[b].y)
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });

        let mut previous_bottom: Option<f32> = None;
        for index in sorted {
            let slot = &arena.slots[index];
            let half = slot.height / 2.0;
            if let Some(bottom) = previous_bottom {
                let top = slot.y - half;
                if top < bottom + min_gap {
                    let delta = bottom + min_gap - top;
                    trace!("Moving {:?} down by {delta}", slot.node.id);
                    shift_subtree(arena, index, delta);
                }
            }
            previous_bottom = Some(arena.slots[index].y + half);
        }
    }
}

fn shift_subtree(arena: &mut Arena<'_>, root: usize, delta: f32) {
    let Arena { slots, graph, .. } = arena;
    let mut dfs = Dfs::new(&*graph, root);
    while let Some(index) = dfs.next(&*graph) {
        slots[index].y += delta;
    }
}
