/// Region label for a raw location string.
///
/// The text is uppercased and split on `,`, `-` and `/`; the last non-empty
/// part wins, so `"Newark, NJ"` and `"Hoboken - NJ"` both map to `NJ`.
/// Returns `None` when nothing but separators and whitespace remain.
pub fn extract_region(location: &str) -> Option<String> {
    location
        .split([',', '-', '/'])
        .map(str::trim)
        .rev()
        .find(|part| !part.is_empty())
        .map(str::to_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_last_part() {
        assert_eq!(extract_region("Newark, NJ").as_deref(), Some("NJ"));
        assert_eq!(extract_region("Hoboken - NJ").as_deref(), Some("NJ"));
        assert_eq!(extract_region("Reno/nv").as_deref(), Some("NV"));
        assert_eq!(extract_region("  california ").as_deref(), Some("CALIFORNIA"));
    }

    #[test]
    fn trailing_separators_are_ignored() {
        assert_eq!(extract_region("Jersey City, NJ,").as_deref(), Some("NJ"));
        assert_eq!(extract_region("Las Vegas, NV / ").as_deref(), Some("NV"));
    }

    #[test]
    fn blank_input_has_no_region() {
        assert_eq!(extract_region(""), None);
        assert_eq!(extract_region(" , - / "), None);
    }
}
