//! Centralized validation and helper functions.

/// Maximum number of markers allowed in a single haplotype map (DOS protection)
pub const MAX_MARKERS: usize = 10_000_000;

/// Tolerance used when comparing minor allele frequencies within a block
pub const MAF_TOLERANCE: f64 = 1e-6;

/// Check whether a value is a probability in [0, 1].
///
/// # Examples
///
/// ```
/// use fp_crosscheck::utils::validation::is_probability;
///
/// assert!(is_probability(0.0));
/// assert!(is_probability(0.4));
/// assert!(!is_probability(1.5));
/// assert!(!is_probability(f64::NAN));
/// ```
#[must_use]
pub fn is_probability(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

/// Whether two allele frequencies are equal within [`MAF_TOLERANCE`].
#[must_use]
pub fn maf_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= MAF_TOLERANCE
}

/// Check if adding another marker would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new marker.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_marker_limit(count: usize) -> Option<String> {
    if count >= MAX_MARKERS {
        Some(format!(
            "Too many markers: adding another would exceed maximum of {MAX_MARKERS}"
        ))
    } else {
        None
    }
}

/// Normalize an allele string to uppercase, rejecting anything that is not a
/// single nucleotide.
#[must_use]
pub fn normalize_allele(s: &str) -> Option<u8> {
    match s.trim().as_bytes() {
        [b] => {
            let upper = b.to_ascii_uppercase();
            matches!(upper, b'A' | b'C' | b'G' | b'T').then_some(upper)
        }
        _ => None,
    }
}
