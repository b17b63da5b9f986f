//! MCU identifier packing.
//!
//! The device reports its unique id as three 32-bit hex words. The integer
//! identifier is formed by writing each word in binary with at least eight
//! digits (no further zero padding), joining the three strings in order and
//! reading the result as one base-2 number.

use crate::error::DeviceIdError;

fn parse_word(field: &str) -> Result<u32, DeviceIdError> {
    let t = field.trim();
    let digits = t
        .strip_prefix("0x")
        .or_else(|| t.strip_prefix("0X"))
        .unwrap_or(t);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DeviceIdError::InvalidHex(field.to_string()));
    }
    u32::from_str_radix(digits, 16).map_err(|_| DeviceIdError::TooWide(field.to_string()))
}

pub fn encode_mcu_uuid(fields: [&str; 3]) -> Result<u128, DeviceIdError> {
    let mut acc: u128 = 0;
    for f in fields {
        let w = parse_word(f)?;
        // binary width of the word, never below 8 digits
        let width = (u32::BITS - w.leading_zeros()).max(8);
        acc = (acc << width) | u128::from(w);
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_reference_words() {
        // 0x001D0026 -> 21 bits, 0x3331470F -> 30 bits, 0x37383632 -> 30 bits
        let id = encode_mcu_uuid(["0x001D0026", "0x3331470F", "0x37383632"]).unwrap();
        let expected = (0x001D_0026u128 << 60) | (0x3331_470Fu128 << 30) | 0x3738_3632u128;
        assert_eq!(id, expected);
        assert_eq!(id, 2_191_222_781_270_616_251_577_906);
    }

    #[test]
    fn small_words_keep_eight_binary_digits() {
        // "00000001" ++ "00000000" ++ "00000011"
        assert_eq!(encode_mcu_uuid(["1", "0", "3"]).unwrap(), 0b1_00000000_00000011);
    }

    #[test]
    fn rejects_bad_hex() {
        assert_eq!(
            encode_mcu_uuid(["0x12", "zz", "0x1"]),
            Err(DeviceIdError::InvalidHex("zz".to_string()))
        );
        assert!(matches!(
            encode_mcu_uuid(["0x123456789", "0", "0"]),
            Err(DeviceIdError::TooWide(_))
        ));
    }
}
