//! Command implementations for the Tunesmith CLI.

pub mod evaluate;
pub mod train;

/// Keep only the settings that were given, so absent ones surface as
/// configuration errors from the resolvers.
pub(crate) fn present_pairs<const N: usize>(
    candidates: [(&'static str, Option<&String>); N],
) -> Vec<(&'static str, String)> {
    candidates.into_iter().filter_map(|(alias, value)| value.map(|v| (alias, v.clone()))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_pairs_skips_missing_values() {
        let model = "models/distilbert".to_string();
        let pairs = present_pairs([("model-path", Some(&model)), ("dataset-path", None)]);
        assert_eq!(pairs, vec![("model-path", "models/distilbert".to_string())]);
    }
}
