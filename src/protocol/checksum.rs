//! XOR checksum shared by inbound ToF frames and every outbound command

/// XOR of the type byte, every length byte and every payload byte.
pub fn xor_checksum(packet_type: u8, length_bytes: &[u8], payload: &[u8]) -> u8 {
    let length = length_bytes.iter().fold(0u8, |acc, b| acc ^ b);
    payload.iter().fold(packet_type ^ length, |acc, b| acc ^ b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_vector() {
        // 0xA1 ^ 0x01 ^ 0x01
        assert_eq!(xor_checksum(0xA1, &[0x01], &[0x01]), 0xA1);
        assert_eq!(xor_checksum(0xA4, &[0x04], &[0x00, 0x05, 0x00, 0x02]), 0xA4 ^ 0x04 ^ 0x05 ^ 0x02);
    }

    proptest! {
        #[test]
        fn single_bit_flip_changes_checksum(
            packet_type in any::<u8>(),
            payload in prop::collection::vec(any::<u8>(), 1..=255),
            index in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let len = [payload.len() as u8];
            let original = xor_checksum(packet_type, &len, &payload);

            let mut corrupted = payload.clone();
            let i = index.index(corrupted.len());
            corrupted[i] ^= 1 << bit;

            prop_assert_ne!(original, xor_checksum(packet_type, &len, &corrupted));
        }
    }
}
