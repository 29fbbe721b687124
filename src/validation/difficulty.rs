//! Compact difficulty encoding (nBits) ⇄ 256-bit target.

use primitive_types::U256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CompactError {
    #[error("compact target has negative sign bit")]
    Negative,
    #[error("compact target overflows 256-bit range")]
    Overflow,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DifficultyEncoder;

impl DifficultyEncoder {
    pub fn decode_compact(&self, bits: u32) -> Result<U256, CompactError> {
        let size = bits >> 24;
        let mut word = bits & 0x007f_ffff;

        if bits & 0x0080_0000 != 0 {
            return Err(CompactError::Negative);
        }

        let value = if size <= 3 {
            word >>= 8 * (3 - size);
            U256::from(word)
        } else {
            if word != 0 && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32)) {
                return Err(CompactError::Overflow);
            }
            U256::from(word) << (8 * (size - 3))
        };

        Ok(value)
    }

    pub fn encode_compact(&self, value: U256) -> u32 {
        if value.is_zero() {
            return 0;
        }

        let mut size = ((value.bits() + 7) / 8) as u32;
        let mut compact = if size <= 3 {
            value.low_u32() << (8 * (3 - size))
        } else {
            (value >> (8 * (size - 3))).low_u32()
        };

        if compact & 0x0080_0000 != 0 {
            compact >>= 8;
            size += 1;
        }

        (size << 24) | (compact & 0x007f_ffff)
    }

    /// Block hash (internal byte order) meets the target encoded by `bits`.
    pub fn meets_target(&self, hash_le: &[u8; 32], bits: u32) -> Result<bool, CompactError> {
        let target = self.decode_compact(bits)?;
        Ok(U256::from_little_endian(hash_le) <= target)
    }
}
