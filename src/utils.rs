//! Numeral conversion, request nonces and shared helpers

use crate::errors::ScrapeError;
use rand::Rng;
use regex::Regex;

/// Digit alphabet for arbitrary-base numerals: digits, then lowercase, then uppercase letters
pub const EXRADIX_DIGITS: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Upper bound (exclusive) of the random nonce component, 36^4
pub const NONCE_RANDOM_SPAN: i64 = 1_679_616;

const NONCE_BASE: u32 = 36;

/// Macro to create a static LazyLock
#[macro_export]
macro_rules! make_static {
    ($expr:expr) => {{ LazyLock::new(|| $expr) }};
}

#[macro_export]
macro_rules! define_regex {
    ($name:ident, $name_text:ident, $text:expr) => {
        static $name_text: &str = $text;

        static $name: LazyLock<std::option::Option<regex::Regex>> =
            make_static!({ Regex::new($text).ok() });
    };
}

pub(crate) fn safe_static_regex(
    regex: Option<regex::Regex>,
    backup: &str,
) -> Result<Regex, ScrapeError> {
    regex.map(Ok).unwrap_or_else(|| {
        Regex::new(backup)
            .map_err(|_| ScrapeError::RegexError("Failed to compile regex".to_string()))
    })
}

fn check_base(base: u32) -> Result<(), ScrapeError> {
    if base as usize > EXRADIX_DIGITS.len() {
        return Err(ScrapeError::BaseTooLarge {
            base,
            max: EXRADIX_DIGITS.len(),
        });
    }
    if base < 2 {
        return Err(ScrapeError::BaseTooSmall(base));
    }
    Ok(())
}

// base must already be validated
fn encode(x: i64, base: u32) -> String {
    let alphabet = EXRADIX_DIGITS.as_bytes();
    if x == 0 {
        return (alphabet[0] as char).to_string();
    }
    let base = base as u64;
    let mut n = x.unsigned_abs();
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(alphabet[(n % base) as usize] as char);
        n /= base;
    }
    if x < 0 {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

/// Converts an integer to a numeral in an arbitrary base
///
/// # Arguments
/// * `x` - the integer to convert
/// * `base` - target base, between 2 and 62
///
/// # Returns
/// * the numeral using [`EXRADIX_DIGITS`], with a leading `-` for negative values
///
/// # Example
/// ```
/// use piazza_harvest::utils::int2base;
/// assert_eq!(int2base(35, 36).unwrap(), "z");
/// assert_eq!(int2base(0, 16).unwrap(), "0");
/// ```
pub fn int2base(x: i64, base: u32) -> Result<String, ScrapeError> {
    check_base(base)?;
    Ok(encode(x, base))
}

/// Inverse of [`int2base`]
pub fn base2int(numeral: &str, base: u32) -> Result<i64, ScrapeError> {
    check_base(base)?;
    let (negative, digits) = match numeral.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, numeral),
    };
    let mut value: i64 = 0;
    for digit in digits.chars() {
        let pos = EXRADIX_DIGITS
            .find(digit)
            .filter(|pos| (*pos as u32) < base)
            .ok_or(ScrapeError::InvalidDigit { digit, base })?;
        value = value
            .checked_mul(base as i64)
            .and_then(|v| v.checked_add(pos as i64))
            .ok_or_else(|| ScrapeError::GenericError(format!("numeral {numeral} overflows i64")))?;
    }
    Ok(if negative { -value } else { value })
}

/// Returns a new request nonce: millisecond timestamp then a random part, both base 36
pub fn nonce() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random = rand::thread_rng().gen_range(0..NONCE_RANDOM_SPAN);
    format!("{}{}", encode(millis, NONCE_BASE), encode(random, NONCE_BASE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn zero_encodes_to_first_digit() {
        for base in [2, 10, 36, 62] {
            assert_eq!(int2base(0, base).unwrap(), "0");
        }
    }

    #[test]
    fn known_values() {
        assert_eq!(int2base(255, 16).unwrap(), "ff");
        assert_eq!(int2base(61, 62).unwrap(), "Z");
        assert_eq!(int2base(36, 36).unwrap(), "10");
        assert_eq!(int2base(-5, 2).unwrap(), "-101");
    }

    #[test]
    fn rejects_base_larger_than_alphabet() {
        let err = int2base(10, 63).unwrap_err();
        assert!(matches!(err, ScrapeError::BaseTooLarge { base: 63, max: 62 }));
        assert!(err.to_string().contains("Base is too large"));
    }

    #[test]
    fn rejects_degenerate_bases() {
        assert!(matches!(int2base(3, 1), Err(ScrapeError::BaseTooSmall(1))));
        assert!(matches!(int2base(3, 0), Err(ScrapeError::BaseTooSmall(0))));
    }

    #[test]
    fn round_trips_across_bases() {
        let samples = [
            0i64,
            1,
            2,
            35,
            36,
            61,
            62,
            1_679_615,
            1_700_000_000_000,
            i64::MAX,
            -42,
        ];
        for base in 2..=62 {
            for &x in &samples {
                let numeral = int2base(x, base).unwrap();
                assert_eq!(base2int(&numeral, base).unwrap(), x, "base {base} value {x}");
            }
        }
    }

    #[test]
    fn base2int_rejects_digit_outside_base() {
        assert!(matches!(
            base2int("19", 8),
            Err(ScrapeError::InvalidDigit { digit: '9', base: 8 })
        ));
    }

    #[test]
    fn nonce_starts_with_current_timestamp() {
        let before = int2base(chrono::Utc::now().timestamp_millis(), 36).unwrap();
        let value = nonce();
        // timestamp part has the same width for the next few decades
        assert!(value.len() > before.len());
        let stamp = base2int(&value[..before.len()], 36).unwrap();
        assert!(stamp >= base2int(&before, 36).unwrap());
        assert!(value.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn nonces_do_not_collide() {
        let values: HashSet<String> = (0..1000).map(|_| nonce()).collect();
        assert!(values.len() >= 999);
    }
}
