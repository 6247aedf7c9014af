use naia_serde::BitWrite;

/// Growable BitWrite that packs bits straight into its buffer, lowest bit
/// of each byte first, the order `naia_serde::BitReader` reads them in.
/// The last byte is zero-padded, so every encoded message is byte aligned.
#[derive(Default)]
pub struct MessageWriter {
    buffer: Vec<u8>,
    bit_length: u32,
}

impl MessageWriter {
    pub fn new() -> Self {
        Self::with_capacity(32)
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(bytes),
            bit_length: 0,
        }
    }

    /// Bits written so far, padding excluded
    pub fn bit_length(&self) -> u32 {
        self.bit_length
    }

    pub fn to_bytes(self) -> Box<[u8]> {
        self.buffer.into_boxed_slice()
    }
}

impl BitWrite for MessageWriter {
    fn write_bit(&mut self, bit: bool) {
        let offset = self.bit_length % 8;
        if offset == 0 {
            self.buffer.push(0);
        }
        if bit {
            if let Some(last) = self.buffer.last_mut() {
                *last |= 1 << offset;
            }
        }
        self.bit_length += 1;
    }

    fn write_byte(&mut self, byte: u8) {
        if self.bit_length % 8 == 0 {
            self.buffer.push(byte);
            self.bit_length += 8;
            return;
        }
        for shift in 0..8 {
            self.write_bit((byte >> shift) & 1 != 0);
        }
    }

    fn count_bits(&mut self, _bits: u32) {}

    fn is_counter(&self) -> bool {
        false
    }
}
