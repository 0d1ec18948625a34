use bytes::{Buf, BufMut};

use super::{BitRead, BitWrite, lower_bits, num_words, words_to_string};

/// An append-only bit stream packed into 64-bit words.
#[derive(Clone, Debug, Default)]
pub struct BitWriter {
    buffer: Vec<u64>,
    /// Total bits written, like an end iterator over the stream.
    end: usize,
}

impl BitWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with room reserved for `num_bits` bits.
    #[must_use]
    pub fn with_capacity(num_bits: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(num_words(num_bits, 64)),
            end: 0,
        }
    }

    /// Returns the size of the written stream in bytes.
    #[must_use]
    pub fn data_size_bytes(&self) -> usize {
        num_words(self.end, 8)
    }

    /// Appends the written stream to `buf`, as bytes in the host's native
    /// word layout.
    pub fn write_to(&self, buf: &mut impl BufMut) {
        let mut left = self.data_size_bytes();
        for word in &self.buffer {
            let bytes = word.to_ne_bytes();
            let n = left.min(bytes.len());
            buf.put_slice(&bytes[..n]);
            left -= n;
        }
    }

    /// Copies the written stream into a new byte buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.data_size_bytes());
        self.write_to(&mut buf);
        buf
    }

    /// Renders the written stream as a left-to-right bit string, zero-padded
    /// to a multiple of 64.
    #[must_use]
    pub fn to_bit_string(&self) -> String {
        words_to_string(&self.buffer)
    }

    /// Surrenders the word buffer backing the stream.
    #[must_use]
    pub fn into_words(self) -> Vec<u64> {
        self.buffer
    }
}

impl BitWrite for BitWriter {
    fn write_bits(&mut self, bits: u64, num_bits: usize) {
        assert!(num_bits <= 64);
        if num_bits == 0 {
            return;
        }
        let bits = lower_bits(bits, num_bits);
        let offset = self.end % 64;
        if offset == 0 {
            self.buffer.push(bits);
        } else {
            *self.buffer.last_mut().unwrap() |= bits << offset;
            if offset + num_bits > 64 {
                // Spill into a fresh word.
                self.buffer.push(bits >> (64 - offset));
            }
        }
        self.end += num_bits;
    }

    fn num_bits(&self) -> usize {
        self.end
    }
}

/// A forward-only cursor reading bits back from an immutable word buffer.
#[derive(Clone, Debug)]
pub struct BitReader {
    buffer: Vec<u64>,
    pos: usize,
}

impl BitReader {
    /// Creates a reader owning the given word buffer.
    #[must_use]
    pub fn new(buffer: Vec<u64>) -> Self {
        Self { buffer, pos: 0 }
    }

    /// Creates a reader over a copy of the given bytes, reassembled into
    /// host-native words with the last partial word zero-padded.
    #[must_use]
    pub fn from_bytes(mut bytes: impl Buf) -> Self {
        let mut buffer = Vec::with_capacity(num_words(bytes.remaining(), 8));
        while bytes.remaining() >= 8 {
            buffer.push(bytes.get_u64_ne());
        }
        if bytes.has_remaining() {
            let mut tail = [0; 8];
            let n = bytes.remaining();
            bytes.copy_to_slice(&mut tail[..n]);
            buffer.push(u64::from_ne_bytes(tail));
        }
        Self::new(buffer)
    }

    fn capacity(&self) -> usize {
        self.buffer.len() * 64
    }
}

impl BitRead for BitReader {
    fn read_bits(&mut self, num_bits: usize) -> (u64, usize) {
        assert!(num_bits <= 64);
        let num_bits = num_bits.min(self.capacity() - self.pos);
        if num_bits == 0 {
            return (0, 0);
        }
        let word = self.pos / 64;
        let offset = self.pos % 64;
        let mut bits = self.buffer[word] >> offset;
        if offset + num_bits > 64 {
            bits |= self.buffer[word + 1] << (64 - offset);
        }
        self.pos += num_bits;
        (lower_bits(bits, num_bits), num_bits)
    }

    fn reached_end(&self) -> bool {
        self.pos >= self.capacity()
    }

    fn only_zeroes_left(&self) -> bool {
        if self.reached_end() {
            return true;
        }
        let word = self.pos / 64;
        if self.buffer[word] >> (self.pos % 64) != 0 {
            return false;
        }
        self.buffer[word + 1..].iter().all(|&w| w == 0)
    }
}
