//! Bounded randomized selection.

use rand::seq::SliceRandom;
use rand::Rng;

/// Cap `items` at `max` entries while keeping some churn in the selection.
///
/// Lists of at most `max` entries are returned unchanged. Longer lists keep
/// their first `max - random_count` entries (the deterministic "closest"
/// prefix) and fill the remainder with `random_count` entries drawn without
/// replacement from the rest.
pub fn randomized_limited_list<T, R>(items: &[T], max: usize, random_count: usize, rng: &mut R) -> Vec<T>
where
    T: Clone,
    R: Rng + ?Sized,
{
    if items.len() <= max {
        return items.to_vec();
    }

    let random_count = random_count.min(max);
    let prefix_len = max - random_count;
    let (prefix, rest) = items.split_at(prefix_len);

    let mut selected = prefix.to_vec();
    selected.extend(rest.choose_multiple(rng, random_count).cloned());
    selected
}
