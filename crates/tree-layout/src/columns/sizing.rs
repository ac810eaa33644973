use super::Arena;

/// Bottom-up pass computing the vertical band each subtree needs.
///
/// A leaf needs its own height, at least `min_leaf_height`. An internal node
/// needs the larger of its own height and its stacked children plus the gaps
/// between them.
pub(crate) fn compute_required_heights(arena: &mut Arena<'_>, min_leaf_height: f32, min_gap: f32) {
    // Pre-order reversed, children are always done before their parent
    for index in (0..arena.slots.len()).rev() {
        let mut count = 0;
        let mut stacked = 0.0;
        for child in arena.children(index) {
            stacked += arena.slots[child].required;
            count += 1;
        }

        let slot = &mut arena.slots[index];
        slot.required = if count == 0 {
            slot.height.max(min_leaf_height)
        } else {
            slot.height.max(stacked + (count - 1) as f32 * min_gap)
        };
    }
}
