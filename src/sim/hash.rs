//! String hashing for seed derivation
//!
//! `h = h * 31 + unit` over UTF-16 code units, wrapped to i32 each step.
//! Not collision resistant.

/// Hash a string to a non-negative 32-bit value. The empty string maps to 0.
pub fn hash_str(s: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in s.encode_utf16() {
        hash = (hash << 5).wrapping_sub(hash).wrapping_add(unit as i32);
    }
    hash.unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(hash_str(""), 0);
    }

    #[test]
    fn test_known_values() {
        assert_eq!(hash_str("a"), 97);
        assert_eq!(hash_str("ab"), 97 * 31 + 98);
        assert_eq!(hash_str("abc"), (97 * 31 + 98) * 31 + 99);
    }

    #[test]
    fn test_wraps_on_long_input() {
        // Long paths overflow i32 many times over; the result must stay stable
        let path = "data/DB/".repeat(64) + "caffeine.mol2";
        assert_eq!(hash_str(&path), hash_str(&path.clone()));
    }

    #[test]
    fn test_overflowing_input_matches_wrapping_reference() {
        for input in ["zzzzzzz", "option-2", "data/DB/ZINC000000123456.mol2"] {
            let mut h: i32 = 0;
            for c in input.chars() {
                h = h.wrapping_mul(31).wrapping_add(c as i32);
            }
            assert_eq!(hash_str(input), h.unsigned_abs());
        }
    }

    #[test]
    fn test_non_ascii_uses_utf16_units() {
        // U+1F9EA is a surrogate pair in UTF-16
        let expected = {
            let mut h: i32 = 0;
            for unit in [0xD83Eu16, 0xDDEA] {
                h = h.wrapping_mul(31).wrapping_add(unit as i32);
            }
            h.unsigned_abs()
        };
        assert_eq!(hash_str("\u{1F9EA}"), expected);
    }

    proptest! {
        #[test]
        fn prop_hash_is_pure(s in ".*") {
            prop_assert_eq!(hash_str(&s), hash_str(&s));
        }
    }
}
