use ethers::types::U256;

/// Largest amount the contract's `i128` argument can carry.
pub fn max_claim_amount() -> U256 {
    U256::from(i128::MAX as u128)
}

/// Format an amount in smallest units as a decimal token value.
///
/// Trailing fractional zeros are dropped, so `1000000000` at 7 decimals
/// renders as `100` and `15000000` as `1.5`. The amount itself is never
/// converted to a float.
pub fn format_token_amount(amount: U256, decimals: u32) -> String {
    let formatted = match ethers::utils::format_units(amount, decimals) {
        Ok(s) => s,
        Err(_) => return amount.to_string(),
    };

    if !formatted.contains('.') {
        return formatted;
    }
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Parse a decimal integer string of smallest units.
pub fn parse_base_units(input: &str) -> Option<U256> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    U256::from_dec_str(trimmed).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== format_token_amount tests ====================

    #[test]
    fn test_format_token_amount_whole() {
        assert_eq!(format_token_amount(U256::from(1_000_000_000u64), 7), "100");
    }

    #[test]
    fn test_format_token_amount_fractional() {
        assert_eq!(format_token_amount(U256::from(15_000_000u64), 7), "1.5");
        assert_eq!(format_token_amount(U256::from(1u64), 7), "0.0000001");
    }

    #[test]
    fn test_format_token_amount_zero() {
        assert_eq!(format_token_amount(U256::zero(), 7), "0");
    }

    #[test]
    fn test_format_token_amount_no_decimals() {
        assert_eq!(format_token_amount(U256::from(4200u64), 0), "4200");
    }

    #[test]
    fn test_format_token_amount_beyond_u128() {
        // 2^128 base units keeps every digit
        let amount = U256::from(u128::MAX) + U256::one();
        assert_eq!(
            format_token_amount(amount, 7),
            "34028236692093846346337460743176.8211456"
        );
    }

    // ==================== parse_base_units tests ====================

    #[test]
    fn test_parse_base_units_valid() {
        assert_eq!(parse_base_units(" 1000 "), Some(U256::from(1000u64)));
    }

    #[test]
    fn test_parse_base_units_rejects_decimal_and_sign() {
        assert_eq!(parse_base_units("1.5"), None);
        assert_eq!(parse_base_units("-3"), None);
        assert_eq!(parse_base_units(""), None);
    }

    #[test]
    fn test_max_claim_amount() {
        assert_eq!(max_claim_amount(), U256::from(i128::MAX as u128));
    }
}
