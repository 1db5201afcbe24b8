//! Storage limit parsing
//!
//! Parses human-entered size tokens such as `500mb` or `10GB` into bytes.

/// Returned by [`parse_storage_limit`] for any input it cannot parse.
/// Callers must reject the input rather than fall back to a default.
pub const INVALID_STORAGE_LIMIT: i64 = -1;

const SUFFIXES: [(&str, u32); 3] = [("kb", 1), ("mb", 2), ("gb", 3)];

/// Parse a size token into bytes.
///
/// A bare integer is a byte count; `kb`, `mb` and `gb` (any case) multiply by
/// 1024, 1024² and 1024³. Returns `None` for blank input, unknown suffixes,
/// non-numeric or negative magnitudes, and results that overflow `i64`.
pub fn try_parse_storage_limit(token: &str) -> Option<u64> {
    let token = token.trim().to_ascii_lowercase();
    if token.is_empty() {
        return None;
    }

    let (magnitude, exponent) = SUFFIXES
        .iter()
        .find_map(|(suffix, exponent)| {
            token
                .strip_suffix(suffix)
                .map(|magnitude| (magnitude.trim(), *exponent))
        })
        .unwrap_or((token.as_str(), 0));

    if magnitude.is_empty() || !magnitude.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let bytes = magnitude
        .parse::<u64>()
        .ok()?
        .checked_mul(1024u64.pow(exponent))?;
    i64::try_from(bytes).ok().map(|_| bytes)
}

/// Parse a size token into bytes, or [`INVALID_STORAGE_LIMIT`] on failure.
pub fn parse_storage_limit(token: &str) -> i64 {
    try_parse_storage_limit(token)
        .and_then(|bytes| i64::try_from(bytes).ok())
        .unwrap_or(INVALID_STORAGE_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_suffixed_tokens() {
        assert_eq!(parse_storage_limit("10gb"), 10 * 1024 * 1024 * 1024);
        assert_eq!(parse_storage_limit("500mb"), 500 * 1024 * 1024);
        assert_eq!(parse_storage_limit("64kb"), 64 * 1024);
        assert_eq!(parse_storage_limit("2GB"), 2 * 1024 * 1024 * 1024);
        assert_eq!(parse_storage_limit("3Mb"), 3 * 1024 * 1024);
    }

    #[test]
    fn test_parses_bare_bytes() {
        assert_eq!(parse_storage_limit("1024"), 1024);
        assert_eq!(parse_storage_limit("0"), 0);
        assert_eq!(parse_storage_limit("  77  "), 77);
    }

    #[test]
    fn test_tolerates_space_before_suffix() {
        assert_eq!(parse_storage_limit("5 mb"), 5 * 1024 * 1024);
    }

    #[test]
    fn test_rejects_garbage() {
        for token in [
            "", "   ", "bogus", "gb", "10tb", "10 b", "1.5gb", "-5", "-5mb", "+5", "ten mb",
        ] {
            assert_eq!(parse_storage_limit(token), INVALID_STORAGE_LIMIT, "{token:?}");
            assert!(try_parse_storage_limit(token).is_none(), "{token:?}");
        }
    }

    #[test]
    fn test_rejects_overflow() {
        assert_eq!(parse_storage_limit("99999999999999999999"), INVALID_STORAGE_LIMIT);
        assert_eq!(parse_storage_limit("9999999999999gb"), INVALID_STORAGE_LIMIT);
        assert_eq!(parse_storage_limit("9223372036854775807"), i64::MAX);
    }
}
