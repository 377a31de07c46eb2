//! Input validators for Stellar identifiers, amounts and free-form metadata.
//!
//! All functions are pure predicates or transformations; they are shared by
//! the orchestrator's build step and by form-level validation in front ends.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Length of every strkey-encoded identifier.
pub const STRKEY_LEN: usize = 56;

/// Largest amount accepted by [`is_valid_amount`].
pub const MAX_AMOUNT: u32 = 1_000_000;

/// Stellar amounts carry at most seven decimal places.
pub const MAX_AMOUNT_SCALE: usize = 7;

/// Maximum length of a sanitized metadata string.
pub const MAX_INPUT_LEN: usize = 1000;

fn is_strkey(value: &str, version: u8) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == STRKEY_LEN
        && bytes[0] == version
        && bytes[1..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(b))
}

/// Account address: `G` followed by 55 base32 characters.
pub fn is_valid_account_id(address: &str) -> bool {
    is_strkey(address, b'G')
}

/// Contract id: `C` followed by 55 base32 characters.
pub fn is_valid_contract_id(contract_id: &str) -> bool {
    is_strkey(contract_id, b'C')
}

/// Secret seed: `S` followed by 55 base32 characters.
pub fn is_valid_secret_seed(secret: &str) -> bool {
    is_strkey(secret, b'S')
}

/// Positive decimal with at most seven fractional digits, no larger than [`MAX_AMOUNT`].
pub fn is_valid_amount(amount: &str) -> bool {
    let (whole, fraction) = match amount.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (amount, None),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if let Some(f) = fraction {
        if f.is_empty() || f.len() > MAX_AMOUNT_SCALE || !f.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }

    match Decimal::from_str(amount) {
        Ok(value) => value > Decimal::ZERO && value <= Decimal::from(MAX_AMOUNT),
        Err(_) => false,
    }
}

/// Strip markup-significant characters, trim, and cap the length.
pub fn sanitize_input(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\'' | '&'))
        .collect::<String>()
        .trim()
        .chars()
        .take(MAX_INPUT_LEN)
        .collect()
}

/// Badge metadata needs a non-blank name and description.
pub fn validate_metadata(name: &str, description: &str) -> bool {
    !name.trim().is_empty() && !description.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(fill: char) -> String {
        format!("G{}", fill.to_string().repeat(55))
    }

    #[test]
    fn test_account_ids() {
        assert!(is_valid_account_id(&account('A')));
        assert!(is_valid_account_id(
            "GDUKMGUGDZQK6YHYA5Z6AY2G4XDSZPSZ3SW5UN3ARVMO6Q4D46B4MBFS"
        ));
        // wrong sentinel, wrong length, outside the base32 alphabet
        assert!(!is_valid_account_id(&format!("C{}", "A".repeat(55))));
        assert!(!is_valid_account_id(&format!("G{}", "A".repeat(54))));
        assert!(!is_valid_account_id(&format!("G{}1", "A".repeat(54))));
        assert!(!is_valid_account_id(&format!("G{}a", "A".repeat(54))));
        assert!(!is_valid_account_id(""));
    }

    #[test]
    fn test_contract_ids() {
        assert!(is_valid_contract_id(
            "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQAHHXCN3A3M"
        ));
        assert!(!is_valid_contract_id(&account('B')));
    }

    #[test]
    fn test_secret_seed() {
        assert!(is_valid_secret_seed(&format!("S{}", "Q".repeat(55))));
        assert!(!is_valid_secret_seed(&account('Q')));
    }

    #[test]
    fn test_amounts() {
        assert!(is_valid_amount("1"));
        assert!(is_valid_amount("0.0000001"));
        assert!(is_valid_amount("1000000"));
        assert!(is_valid_amount("12.5"));

        assert!(!is_valid_amount("0"));
        assert!(!is_valid_amount("0.0"));
        assert!(!is_valid_amount("1000000.0000001"));
        assert!(!is_valid_amount("1.12345678"));
        assert!(!is_valid_amount("-1"));
        assert!(!is_valid_amount("1e3"));
        assert!(!is_valid_amount(".5"));
        assert!(!is_valid_amount("5."));
        assert!(!is_valid_amount(""));
    }

    #[test]
    fn test_sanitize_input() {
        assert_eq!(sanitize_input("  <b>Gold</b> & \"VIP\" "), "bGold/b  VIP");
        let long = "x".repeat(MAX_INPUT_LEN + 50);
        assert_eq!(sanitize_input(&long).len(), MAX_INPUT_LEN);
    }

    #[test]
    fn test_validate_metadata() {
        assert!(validate_metadata("Early Adopter", "First members"));
        assert!(!validate_metadata("  ", "First members"));
        assert!(!validate_metadata("Early Adopter", ""));
    }
}
