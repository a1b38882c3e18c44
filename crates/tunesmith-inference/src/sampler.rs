use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tunesmith_training::{Example, Label};

/// The test split as a finite, restartable sequence of `(text, label)` pairs.
///
/// Every call to [`ShuffledExamples::iter`] draws a fresh order, unless a seed
/// is fixed, in which case every iteration yields the same order.
#[derive(Debug, Clone)]
pub struct ShuffledExamples {
    examples: Vec<Example>,
    seed: Option<u64>,
}

impl ShuffledExamples {
    #[must_use]
    pub fn new(examples: Vec<Example>, seed: Option<u64>) -> Self {
        Self { examples, seed }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Label)> + '_ {
        let mut order: Vec<usize> = (0..self.examples.len()).collect();
        match self.seed {
            Some(seed) => order.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => order.shuffle(&mut rand::thread_rng()),
        }
        order.into_iter().map(move |idx| {
            let ex = &self.examples[idx];
            (ex.text.as_str(), &ex.label)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn examples(n: usize) -> Vec<Example> {
        (0..n).map(|i| Example { text: format!("text {i}"), label: Label::Id(i as i64) }).collect()
    }

    #[test]
    fn test_iter_is_a_permutation() {
        let seq = ShuffledExamples::new(examples(50), None);
        let mut seen: Vec<String> = seq.iter().map(|(t, _)| t.to_string()).collect();
        assert_eq!(seen.len(), 50);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 50);
    }

    #[test]
    fn test_seeded_order_repeats() {
        let seq = ShuffledExamples::new(examples(20), Some(7));
        let a: Vec<_> = seq.iter().map(|(t, _)| t.to_string()).collect();
        let b: Vec<_> = seq.iter().map(|(t, _)| t.to_string()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_labels_stay_with_their_text() {
        let seq = ShuffledExamples::new(examples(10), None);
        for (text, label) in seq.iter() {
            assert_eq!(text, format!("text {label}"));
        }
    }

    #[test]
    fn test_empty_sequence() {
        let seq = ShuffledExamples::new(Vec::new(), None);
        assert!(seq.is_empty());
        assert_eq!(seq.iter().count(), 0);
    }
}
