//! Bitwise CRC-8 (MSB first, zero init, no final XOR).
//!
//! The divisor is a construction parameter; the firmware uses 0x07. No
//! lookup table — 256 bytes of RAM matter more than the handful of cycles
//! per byte on the serial path.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc8 {
    divisor: u8,
}

impl Crc8 {
    pub const fn new(divisor: u8) -> Self {
        Self { divisor }
    }

    pub const fn divisor(&self) -> u8 {
        self.divisor
    }

    /// Checksum over `data`.
    pub fn compute(&self, data: &[u8]) -> u8 {
        data.iter().fold(0u8, |crc, &byte| self.update(crc, byte))
    }

    /// Fold one more byte into a running checksum.
    pub fn update(&self, crc: u8, byte: u8) -> u8 {
        let mut crc = crc ^ byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ self.divisor
            } else {
                crc << 1
            };
        }
        crc
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn deterministic(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let crc = Crc8::new(0x07);
            prop_assert_eq!(crc.compute(&data), crc.compute(&data));
        }

        #[test]
        fn single_bit_flip_always_detected(
            data in proptest::collection::vec(any::<u8>(), 1..32),
            pos in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            // A degree-8 generator with x^0 set catches every single-bit error.
            let crc = Crc8::new(0x07);
            let mut flipped = data.clone();
            let i = pos.index(flipped.len());
            flipped[i] ^= 1 << bit;
            prop_assert_ne!(crc.compute(&data), crc.compute(&flipped));
        }
    }
}
