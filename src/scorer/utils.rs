/// Lower-cases and collapses whitespace runs. The model was trained
/// on text preprocessed exactly this way.
pub(crate) fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Index of the largest logit. Ties resolve to the first maximum.
pub(crate) fn argmax(logits: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in logits.iter().enumerate() {
        if v > logits[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(
            normalize_text("  Fuite  d'huile\tsur POMPE\n P-101 "),
            "fuite d'huile sur pompe p-101"
        );
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_text("   \t\n"), "");
    }

    #[test]
    fn test_argmax_picks_largest() {
        assert_eq!(argmax(&[0.1, 2.5, -1.0, 2.4, 0.0, 1.9]), 1);
    }

    #[test]
    fn test_argmax_tie_takes_first() {
        assert_eq!(argmax(&[1.0, 1.0, 1.0]), 0);
    }

    #[test]
    fn test_argmax_single() {
        assert_eq!(argmax(&[-3.0]), 0);
    }
}
