/// A running checksum that can be fed whole bytes or partial-width chunks.
///
/// Implemented by [`Crc8`](crate::Crc8) and [`Crc16`](crate::Crc16) so that
/// frame code can stay generic over the checksum width.
pub trait Checksum: Default {
    /// Width of the checksum in bits.
    const WIDTH: u8;

    /// Reset to the initial state.
    fn reset(&mut self);

    /// Mix one byte into the checksum.
    fn update(&mut self, byte: u8);

    /// Mix the low `n_bits` bits of `value` (1..=16, MSB first).
    fn update_bits(&mut self, value: u16, n_bits: u8);

    /// Mix a run of bytes.
    fn update_slice(&mut self, data: &[u8]) {
        for &byte in data {
            self.update(byte);
        }
    }

    /// The finished checksum, widened to `u16`.
    fn finish(&self) -> u16;
}
