use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const LABEL_MAX_CHARS: usize = 42;

/// Shortens a node label for canvas display, keeping whole characters.
pub fn display_label(label: &str) -> String {
    let trimmed = label.trim();
    if trimmed.chars().count() <= LABEL_MAX_CHARS {
        return trimmed.to_owned();
    }

    let mut shortened = trimmed
        .chars()
        .take(LABEL_MAX_CHARS - 1)
        .collect::<String>();
    shortened.push('…');
    shortened
}

/// Deterministic pseudo-random pair in `[-1, 1]` derived from an id.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_labels_pass_through() {
        assert_eq!(display_label("  Rust ownership "), "Rust ownership");
    }

    #[test]
    fn long_labels_are_cut_on_char_boundaries() {
        let label = "ё".repeat(60);
        let shown = display_label(&label);
        assert_eq!(shown.chars().count(), LABEL_MAX_CHARS);
        assert!(shown.ends_with('…'));
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let (x, y) = stable_pair("concept_1");
        assert_eq!((x, y), stable_pair("concept_1"));
        assert!((-1.0..=1.0).contains(&x));
        assert!((-1.0..=1.0).contains(&y));
    }
}
