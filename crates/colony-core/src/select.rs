//! Probability-weighted choice among candidates.
//!
//! Both the task selector and the mission registry choose by the same
//! rule: draw a uniform value in `[0, total)`, walk the candidates in
//! their given (stable) order accumulating weight, and take the first
//! candidate whose cumulative weight exceeds the draw. At an exact
//! boundary the earlier candidate wins.

use rand::Rng;

/// Weight a candidate contributes; negative and non-finite weights count
/// as zero.
fn effective(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

/// Sum of the effective weights of `candidates`.
pub fn total_weight<T>(candidates: &[(T, f64)]) -> f64 {
    candidates.iter().map(|(_, w)| effective(*w)).sum()
}

/// Choose one candidate with probability proportional to its weight.
///
/// Returns `None` if the total weight is not positive.
pub fn weighted_pick<'a, T, R: Rng>(
    candidates: &'a [(T, f64)],
    rng: &mut R,
) -> Option<&'a T> {
    let total = total_weight(candidates);
    if total <= 0.0 {
        return None;
    }
    let draw = rng.random::<f64>() * total;
    pick_at(candidates, draw)
}

/// Walk `candidates` and return the first whose cumulative weight exceeds
/// `draw`. Rounding residue at the top end falls back to the last
/// candidate with positive weight.
fn pick_at<T>(candidates: &[(T, f64)], draw: f64) -> Option<&T> {
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (item, weight) in candidates {
        let weight = effective(*weight);
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = Some(item);
        if cumulative > draw {
            return Some(item);
        }
    }
    last_positive
}
