/// Weighted random selection over declaration-ordered variants.

use rand::rngs::StdRng;
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// Every variant weighs zero or less; nothing can be drawn.
    #[error("no selectable variant: total weight is not positive")]
    NoValidVariant,
}

/// Select one index from `weights` with probability proportional to weight.
///
/// Weights need not sum to any particular total; the draw normalizes by the
/// sum. The walk accumulates in declaration order and returns the first
/// variant whose cumulative weight exceeds the drawn point, so a fixed rng
/// seed reproduces the same selection. Variants with zero, negative, or
/// non-finite weight are never selected.
pub fn select_index(weights: &[f32], rng: &mut StdRng) -> Result<usize, SelectionError> {
    let total: f32 = weights.iter().copied().filter(|w| selectable(*w)).sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(SelectionError::NoValidVariant);
    }

    let roll = rng.gen_range(0.0..total);
    let mut cumulative = 0.0f32;
    for (i, &weight) in weights.iter().enumerate() {
        if !selectable(weight) {
            continue;
        }
        cumulative += weight;
        if roll < cumulative {
            return Ok(i);
        }
    }

    // Float accumulation can leave the final cumulative a hair under the
    // total; the draw then belongs to the last selectable variant.
    weights
        .iter()
        .rposition(|w| selectable(*w))
        .ok_or(SelectionError::NoValidVariant)
}

fn selectable(weight: f32) -> bool {
    weight.is_finite() && weight > 0.0
}
