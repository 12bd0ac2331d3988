//! Spanish-locale number normalization.

/// Parse a number written with `.` thousands separators and `,` decimals.
///
/// Empty cells and dash placeholders are absent, as is anything that does
/// not parse after normalization. A trailing `%` is dropped.
pub fn parse_es_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if matches!(text, "" | "-" | "--") {
        return None;
    }
    let normalized: String = text
        .chars()
        .filter(|c| *c != '.' && *c != '%')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    normalized.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn group_thousands(n: u64) -> String {
        let digits = n.to_string();
        let mut out = String::new();
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push('.');
            }
            out.push(c);
        }
        out
    }

    #[test]
    fn placeholders_are_absent() {
        assert_eq!(parse_es_number(""), None);
        assert_eq!(parse_es_number("-"), None);
        assert_eq!(parse_es_number("--"), None);
        assert_eq!(parse_es_number("  "), None);
    }

    #[test]
    fn thousands_and_decimals() {
        assert_eq!(parse_es_number("1.234,56"), Some(1234.56));
        assert_eq!(parse_es_number("12,5"), Some(12.5));
        assert_eq!(parse_es_number("2.000"), Some(2000.0));
        assert_eq!(parse_es_number("-3,2"), Some(-3.2));
    }

    #[test]
    fn percent_suffix() {
        assert_eq!(parse_es_number("+1,25%"), Some(1.25));
    }

    #[test]
    fn garbage_is_absent() {
        assert_eq!(parse_es_number("n/d"), None);
        assert_eq!(parse_es_number("inf"), None);
    }

    proptest! {
        #[test]
        fn grouped_numbers_parse_like_plain_ones(n in 0u64..100_000_000, cents in 0u32..100) {
            let es = format!("{},{cents:02}", group_thousands(n));
            let plain: f64 = format!("{n}.{cents:02}").parse().unwrap();
            prop_assert_eq!(parse_es_number(&es), Some(plain));
        }
    }
}
