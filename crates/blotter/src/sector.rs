//! Sector label canonicalization.

/// Fixed rename table applied to input sector labels (old label, canonical label).
pub const SECTOR_RENAMES: &[(&str, &str)] = &[("Technology", "Information Technology")];

/// The canonical form of a sector label.
///
/// Labels not in [`SECTOR_RENAMES`] are already canonical.
pub fn canonical_sector(label: &str) -> &str {
    SECTOR_RENAMES
        .iter()
        .find_map(|&(old, new)| (old == label).then_some(new))
        .unwrap_or(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Technology", "Information Technology")]
    #[case("Information Technology", "Information Technology")]
    #[case("Health Care", "Health Care")]
    #[case("technology", "technology")]
    fn test_canonical_sector(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(canonical_sector(input), expected);
    }
}
