pub mod datetime;
pub mod json;

use alloy::primitives::{
    Address, FixedBytes, hex,
    utils::{ParseUnits, format_units},
};

use crate::errors::{DepositError, Result};

/// Decodes a hex string, with or without the `0x` prefix
pub fn parse_hex(field: &'static str, s: &str) -> Result<Vec<u8>> {
    hex::decode(s.trim()).map_err(|e| DepositError::InvalidHex(format!("{field}: {e}")))
}

/// Decodes a hex string of exactly `N` bytes
pub fn parse_fixed_hex<const N: usize>(field: &'static str, s: &str) -> Result<FixedBytes<N>> {
    crate::ssz::fixed_field::<N>(field, &parse_hex(field, s)?)
}

/// Parses a 20-byte `0x` prefixed address.
///
/// Mixed case input must carry a valid EIP-55 checksum, a single mistyped
/// character would otherwise route funds to an unrelated address.
pub fn parse_address(s: &str) -> Result<Address> {
    let s = s.trim();
    let invalid = || DepositError::InvalidAddressFormat(s.to_string());
    let digits = s.strip_prefix("0x").ok_or_else(invalid)?;
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let is_mixed_case = digits.chars().any(|c| c.is_ascii_uppercase())
        && digits.chars().any(|c| c.is_ascii_lowercase());
    match is_mixed_case {
        true => Address::parse_checksummed(s, None).map_err(|_| invalid()),
        false => s.parse::<Address>().map_err(|_| invalid()),
    }
}

/// Lower-case `0x` prefixed hex, the format used at every external boundary
pub fn to_hex<T: AsRef<[u8]>>(bytes: T) -> String {
    hex::encode_prefixed(bytes)
}

pub fn format_unit<T>(amount: &T, decimals: u8) -> String
where
    T: Into<ParseUnits> + Copy,
{
    // decimals <= 77 never fails
    let units = format_units(*amount, decimals).unwrap_or_default();
    let v: Vec<&str> = units.split('.').collect();
    match v.as_slice() {
        [whole, fractional] => {
            let fractional = fractional.trim_end_matches('0');
            match fractional.len() {
                0 => whole.to_string(),
                _ => format!("{}.{}", whole, fractional),
            }
        }
        _ => units,
    }
}

/// Formats an amount in gwei as ether
pub fn format_gwei_as_eth(amount_gwei: u64) -> String {
    format_unit(&amount_gwei, 9)
}
