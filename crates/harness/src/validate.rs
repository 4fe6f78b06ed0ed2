//! Format checks for fixture values.
//!
//! Every validator is total: it either returns the canonical form of the input or a
//! [`FixtureError`] describing what is wrong with it.

/// Number of hex characters in a 32-byte hash.
const HASH_HEX_LEN: usize = 64;

/// Number of hex characters in a 20-byte address.
const ADDRESS_HEX_LEN: usize = 40;

/// A fixture value that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixtureError {
    /// The value was empty.
    #[error("{kind} is required")]
    Missing {
        /// What was being validated.
        kind: FixtureKind,
    },
    /// The value is not a non-negative integer.
    #[error("invalid {kind} format: {value:?}. Must be a non-negative integer")]
    NotAnInteger {
        /// What was being validated.
        kind: FixtureKind,
        /// The rejected input.
        value: String,
    },
    /// The value does not start with `0x`.
    #[error("invalid {kind} format: {value:?}. Must start with \"0x\"")]
    MissingPrefix {
        /// What was being validated.
        kind: FixtureKind,
        /// The rejected input.
        value: String,
    },
    /// The value has the wrong number of characters after the prefix.
    #[error(
        "invalid {kind} length: {actual} characters. Must be {expected} characters ({} bytes) after \"0x\" prefix",
        .expected / 2
    )]
    Length {
        /// What was being validated.
        kind: FixtureKind,
        /// Characters found after the prefix.
        actual: usize,
        /// Characters required after the prefix.
        expected: usize,
    },
    /// The value contains a non-hex character.
    #[error("invalid {kind} characters: {value:?}. Must contain only hexadecimal characters")]
    NotHex {
        /// What was being validated.
        kind: FixtureKind,
        /// The rejected input.
        value: String,
    },
}

/// The kind of fixture a [`FixtureError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    /// A block number.
    BlockNumber,
    /// A block hash.
    BlockHash,
    /// A transaction hash.
    TxHash,
    /// An account or contract address.
    Address,
}

impl std::fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlockNumber => f.write_str("block number"),
            Self::BlockHash => f.write_str("block hash"),
            Self::TxHash => f.write_str("transaction hash"),
            Self::Address => f.write_str("address"),
        }
    }
}

/// Validates a block number given in decimal or `0x` hex and returns it as `0x` lowercase hex.
pub fn validate_block_number(raw: &str) -> Result<String, FixtureError> {
    parse_block_number(raw).map(|number| format!("{number:#x}"))
}

/// Parses a block number given in decimal or `0x` hex.
pub fn parse_block_number(raw: &str) -> Result<u64, FixtureError> {
    let kind = FixtureKind::BlockNumber;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FixtureError::Missing { kind })
    }

    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|_| FixtureError::NotAnInteger { kind, value: raw.to_string() })
}

/// Validates a 32-byte block hash.
pub fn validate_block_hash(raw: &str) -> Result<String, FixtureError> {
    validate_hex(raw, FixtureKind::BlockHash, HASH_HEX_LEN)
}

/// Validates a 32-byte transaction hash.
pub fn validate_tx_hash(raw: &str) -> Result<String, FixtureError> {
    validate_hex(raw, FixtureKind::TxHash, HASH_HEX_LEN)
}

/// Validates a 20-byte address.
pub fn validate_address(raw: &str) -> Result<String, FixtureError> {
    validate_hex(raw, FixtureKind::Address, ADDRESS_HEX_LEN)
}

/// Checks for a `0x` prefix followed by exactly `expected` hex characters of either case.
///
/// Returns the lowercase form on success.
fn validate_hex(raw: &str, kind: FixtureKind, expected: usize) -> Result<String, FixtureError> {
    if raw.is_empty() {
        return Err(FixtureError::Missing { kind })
    }
    let Some(digits) = raw.strip_prefix("0x") else {
        return Err(FixtureError::MissingPrefix { kind, value: raw.to_string() })
    };
    // count chars, not bytes, so multi-byte input reports a sensible length
    let actual = digits.chars().count();
    if actual != expected {
        return Err(FixtureError::Length { kind, actual, expected })
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(FixtureError::NotHex { kind, value: raw.to_string() })
    }
    Ok(raw.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "0x5525c63a805df2b83c113ebcc8c7672a3b290673c4e81335b410cd9ebc64e085";

    #[test]
    fn block_number_canonical_hex() {
        assert_eq!(validate_block_number("0").unwrap(), "0x0");
        assert_eq!(validate_block_number("255").unwrap(), "0xff");
        assert_eq!(validate_block_number("0xFF").unwrap(), "0xff");
        assert_eq!(validate_block_number(" 42 ").unwrap(), "0x2a");
    }

    #[test]
    fn block_number_rejects_garbage() {
        assert_eq!(
            validate_block_number(""),
            Err(FixtureError::Missing { kind: FixtureKind::BlockNumber })
        );
        assert!(matches!(validate_block_number("-1"), Err(FixtureError::NotAnInteger { .. })));
        assert!(matches!(validate_block_number("12abc"), Err(FixtureError::NotAnInteger { .. })));
        assert!(matches!(validate_block_number("0x"), Err(FixtureError::NotAnInteger { .. })));
    }

    #[test]
    fn block_hash_accepts_both_cases() {
        assert_eq!(validate_block_hash(HASH).unwrap(), HASH);
        let upper = format!("0x{}", HASH[2..].to_uppercase());
        assert_eq!(validate_block_hash(&upper).unwrap(), HASH);
        assert_eq!(validate_tx_hash(&upper).unwrap(), HASH);
    }

    #[test]
    fn block_hash_rejections() {
        assert!(matches!(
            validate_block_hash(&HASH[2..]),
            Err(FixtureError::MissingPrefix { kind: FixtureKind::BlockHash, .. })
        ));
        assert_eq!(
            validate_block_hash(&HASH[..65]),
            Err(FixtureError::Length { kind: FixtureKind::BlockHash, actual: 63, expected: 64 })
        );
        assert_eq!(
            validate_block_hash(&format!("{HASH}0")),
            Err(FixtureError::Length { kind: FixtureKind::BlockHash, actual: 65, expected: 64 })
        );
        let bad = format!("0x{}g", &HASH[2..65]);
        assert!(matches!(validate_block_hash(&bad), Err(FixtureError::NotHex { .. })));
        assert!(matches!(validate_block_hash(""), Err(FixtureError::Missing { .. })));
    }

    #[test]
    fn address_rule() {
        let address = "0x000000000000000000000000000000000000800A";
        assert_eq!(validate_address(address).unwrap(), "0x000000000000000000000000000000000000800a");
        assert!(matches!(validate_address(HASH), Err(FixtureError::Length { actual: 64, .. })));
        assert!(matches!(
            validate_address("0x00000000000000000000000000000000000080zz"),
            Err(FixtureError::NotHex { .. })
        ));
    }

    #[test]
    fn tx_hash_reports_its_kind() {
        let err = validate_tx_hash("0x1234").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid transaction hash length: 4 characters. Must be 64 characters (32 bytes) after \"0x\" prefix"
        );
    }
}
