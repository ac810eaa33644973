use super::Arena;
use crate::Point;

/// Top-down pass giving every node its column and a vertical position.
///
/// Roots are stacked from `base` downwards, the first one centered on it.
/// Inside a node's band its children's bands are stacked in order and the
/// whole stack is centered on the node. Each node sits at the center of its
/// own band.
pub(crate) fn place_bands(arena: &mut Arena<'_>, base: Point, level_spacing: f32, min_gap: f32) {
    let first = arena.roots.first().map(|&r| arena.slots[r].required).unwrap_or(0.0);
    let mut top = base.y - first / 2.0;
    for i in 0..arena.roots.len() {
        let root = arena.roots[i];
        let slot = &mut arena.slots[root];
        slot.y = top + slot.required / 2.0;
        top += slot.required + min_gap;
    }

    // Pre-order, a parent is always placed before its children
    for index in 0..arena.slots.len() {
        let slot = &mut arena.slots[index];
        slot.x = base.x + slot.level as f32 * level_spacing;
        let center = slot.y;

        let children: Vec<usize> = arena.children(index).collect();
        if children.is_empty() {
            continue;
        }

        let stacked: f32 = children.iter().map(|&c| arena.slots[c].required).sum::<f32>()
            + (children.len() - 1) as f32 * min_gap;
        let mut top = center - stacked / 2.0;
        for child in children {
            let slot = &mut arena.slots[child];
            slot.y = top + slot.required / 2.0;
            top += slot.required + min_gap;
        }
    }
}

/// Bottom-up pass moving every parent to the mean height of its children
pub(crate) fn recenter_parents(arena: &mut Arena<'_>) {
    for index in (0..arena.slots.len()).rev() {
        let mut count = 0;
        let mut sum = 0.0;
        for child in arena.children(index) {
            sum += arena.slots[child].y;
            count += 1;
        }
        if count > 0 {
            arena.slots[index].y = sum / count as f32;
        }
    }
}
