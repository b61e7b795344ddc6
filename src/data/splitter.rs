// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Shuffles items with a seeded RNG and splits them into:
//   - Training set: used to update model weights
//   - Test set:     used for per-epoch evaluation
//
// Why seeded?
//   Word lists are grouped by category on disk, so an unshuffled
//   split would put only DESCRIPTOR words in the test set. The
//   seed makes the shuffle repeatable, so two runs with the same
//   config evaluate on exactly the same words.
//
// Test size = round(n * test_size), clamped to [0, n].
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `items` with `seed` and split into (train, test).
pub fn split_train_test<T>(mut items: Vec<T>, test_size: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);

    let total      = items.len();
    let test_count = ((total as f64) * test_size.clamp(0.0, 1.0)).round() as usize;
    let test_count = test_count.min(total);

    // split_off(n) leaves [0..n] in `items` and returns the rest
    let test = items.split_off(total - test_count);

    tracing::debug!(
        "Dataset split: {} train, {} test (seed {})",
        items.len(),
        test.len(),
        seed
    );

    (items, test)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, test)     = split_train_test(items, 0.1, 50);
        assert_eq!(train.len(), 90);
        assert_eq!(test.len(),  10);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize>     = (0..57).collect();
        let (mut train, test)     = split_train_test(items, 0.3, 1);
        train.extend(test);
        train.sort_unstable();
        assert_eq!(train, (0..57).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_train_test((0..40).collect::<Vec<u32>>(), 0.25, 50);
        let b = split_train_test((0..40).collect::<Vec<u32>>(), 0.25, 50);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_different_order() {
        let (a, _) = split_train_test((0..40).collect::<Vec<u32>>(), 0.0, 1);
        let (b, _) = split_train_test((0..40).collect::<Vec<u32>>(), 0.0, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        let (train, test) = split_train_test(Vec::<u8>::new(), 0.1, 50);
        assert!(train.is_empty());
        assert!(test.is_empty());
    }

    #[test]
    fn test_out_of_range_fraction_is_clamped() {
        let (train, test) = split_train_test((0..10).collect::<Vec<u8>>(), 1.5, 50);
        assert!(train.is_empty());
        assert_eq!(test.len(), 10);
    }
}
