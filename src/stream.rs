//! Bit-level stream encoding and decoding over 64-bit word buffers.
//!
//! A stream is a sequence of bits packed into `u64` words, first bit lowest.
//! Bit strings (`'0'`/`'1'` text read left to right, first character = first
//! bit) mirror that order, which is the reverse of conventional binary
//! printing; they are a debugging aid, never a wire format.
//!
//! [`BitWrite`] and [`BitRead`] expose the raw bit operations and layer the
//! variable-width chunked codec on top; [`BitWriter`] and [`BitReader`] are
//! the word-packed implementations.

mod word;


pub use word::{BitReader, BitWriter};

/// Returns how many `word_bits`-sized words are needed to store `num_bits`.
#[must_use]
pub fn num_words(num_bits: usize, word_bits: usize) -> usize {
    num_bits.div_ceil(word_bits)
}

/// Masks `bits` to its `num_bits` lowest bits.
///
/// Returns `bits` unchanged if `num_bits` is 64 or more.
#[must_use]
pub fn lower_bits(bits: u64, num_bits: usize) -> u64 {
    if num_bits >= 64 {
        bits
    } else {
        bits & ((1 << num_bits) - 1)
    }
}

/// Maps a signed integer to an unsigned one in zigzag order.
///
/// 0, -1, 1, -2, 2 map to 0, 1, 2, 3, 4, so small magnitudes of either sign
/// stay close to zero, where variable-width encoding is cheapest.
#[must_use]
pub fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Undoes [`zigzag_encode`].
#[must_use]
pub fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) ^ (n & 1).wrapping_neg()) as i64
}

/// Maps a signed integer to an unsigned one in blocks of `2^block_exponent`.
///
/// The `block_exponent` low magnitude bits pass through untouched, so runs
/// of values with nearby magnitudes differ only in their upper encoded bits.
/// With a block exponent of 0 this degenerates into [`zigzag_encode`].
///
/// # Panics
///
/// Panics if `block_exponent` is 64 or more.
#[must_use]
pub fn zigzag_encode_block(n: i64, block_exponent: usize) -> u64 {
    assert!(block_exponent < 64);
    // For negative n, !n is the magnitude -n - 1 without overflow at i64::MIN.
    let mag = if n >= 0 { n as u64 } else { !n as u64 };
    let block_num = ((mag >> block_exponent) << 1) | u64::from(n < 0);
    (block_num << block_exponent) + lower_bits(mag, block_exponent)
}

/// Undoes [`zigzag_encode_block`] for the same `block_exponent`.
///
/// # Panics
///
/// Panics if `block_exponent` is 64 or more.
#[must_use]
pub fn zigzag_decode_block(n: u64, block_exponent: usize) -> i64 {
    assert!(block_exponent < 64);
    let block_num = n >> block_exponent;
    let mag = (((block_num >> 1) << block_exponent) + lower_bits(n, block_exponent)) as i64;
    if block_num & 1 != 0 { -1 - mag } else { mag }
}

/// Renders the `num_bits` lowest bits of `bits` as a left-to-right bit string.
#[must_use]
pub fn bits_to_string(bits: u64, num_bits: usize) -> String {
    assert!(num_bits <= 64);
    (0..num_bits)
        .map(|i| if bits >> i & 1 != 0 { '1' } else { '0' })
        .collect()
}

fn bits_from_ascii(chunk: &[u8]) -> u64 {
    let mut bits = 0;
    for (i, &c) in chunk.iter().enumerate() {
        assert!(c == b'0' || c == b'1');
        if c == b'1' {
            bits |= 1 << i;
        }
    }
    bits
}

/// Parses a left-to-right bit string of at most 64 characters.
///
/// The first character is the lowest bit, so `"01"` parses to 2, not 1.
#[must_use]
pub fn string_to_bits(s: &str) -> u64 {
    assert!(s.len() <= 64);
    bits_from_ascii(s.as_bytes())
}

/// Renders a word buffer as a left-to-right bit string.
#[must_use]
pub fn words_to_string(words: &[u64]) -> String {
    words.iter().map(|&word| bits_to_string(word, 64)).collect()
}

/// Parses a left-to-right bit string into a word buffer, leaving the unused
/// tail of the last word zero.
#[must_use]
pub fn string_to_words(s: &str) -> Vec<u64> {
    s.as_bytes().chunks(64).map(bits_from_ascii).collect()
}

/// Appends `'0'` characters until the length is a multiple of `num_bits`.
#[must_use]
pub fn pad_to_multiple(mut s: String, num_bits: usize) -> String {
    let tail = s.len() % num_bits;
    if tail != 0 {
        s.push_str(&"0".repeat(num_bits - tail));
    }
    s
}

/// Writes `val` in `chunk_length`-bit chunks, least significant first,
/// stopping once `total_bits` bits of payload are down.
fn write_variable_width<W: BitWrite + ?Sized>(
    writer: &mut W,
    val: u64,
    chunk_length: usize,
    total_bits: usize,
) {
    assert!(chunk_length > 0);
    let mut remaining = val;
    let mut emitted = 0;
    loop {
        // The last chunk may be cut short: the payload width is tracked
        // against total_bits, which need not be a multiple of chunk_length.
        let n = chunk_length.min(total_bits - emitted);
        writer.write_bits(remaining, n);
        emitted += n;
        if emitted >= total_bits {
            return;
        }
        remaining >>= n;
        writer.write_bits(u64::from(remaining != 0), 1);
        if remaining == 0 {
            return;
        }
    }
}

/// Reads a value written by [`write_variable_width`] with the same
/// `chunk_length` and `total_bits`.
fn read_variable_width<R: BitRead + ?Sized>(
    reader: &mut R,
    chunk_length: usize,
    total_bits: usize,
) -> Option<u64> {
    assert!(chunk_length > 0);
    let mut val = 0;
    let mut consumed = 0;
    loop {
        let n = chunk_length.min(total_bits - consumed);
        let (bits, num_read) = reader.read_bits(n);
        if num_read != n {
            return None;
        }
        val |= bits << consumed;
        consumed += n;
        if consumed >= total_bits {
            return Some(val);
        }
        let (more, num_read) = reader.read_bits(1);
        if num_read != 1 {
            return None;
        }
        if more == 0 {
            return Some(val);
        }
    }
}

/// A sink for raw bit writes, with the variable-width codec layered on top.
pub trait BitWrite {
    /// Writes the `num_bits` lowest bits of `bits` to the stream.
    ///
    /// # Panics
    ///
    /// Panics if `num_bits` is greater than 64.
    fn write_bits(&mut self, bits: u64, num_bits: usize);

    /// Returns the total number of bits written.
    fn num_bits(&self) -> usize;

    /// Writes a left-to-right bit string of at most 64 characters.
    ///
    /// The first character is the first bit written, so `"01"` writes the
    /// value 2, not 1.
    fn write_bit_string(&mut self, bits: &str) {
        self.write_bits(string_to_bits(bits), bits.len());
    }

    /// Writes `val` in `chunk_length`-bit chunks, least significant first.
    ///
    /// Each chunk is followed by a continuation bit (1 = more chunks follow)
    /// unless 64 bits of payload are already down, in which case the width
    /// alone marks the end. 255 in chunks of 4 becomes `1111111110`.
    fn write_u64_varint(&mut self, val: u64, chunk_length: usize) {
        write_variable_width(self, val, chunk_length, 64);
    }

    /// Like [`write_u64_varint`](Self::write_u64_varint) with a 32-bit payload.
    fn write_u32_varint(&mut self, val: u32, chunk_length: usize) {
        write_variable_width(self, val.into(), chunk_length, 32);
    }

    /// Like [`write_u64_varint`](Self::write_u64_varint) with a 16-bit payload.
    fn write_u16_varint(&mut self, val: u16, chunk_length: usize) {
        write_variable_width(self, val.into(), chunk_length, 16);
    }

    /// Like [`write_u64_varint`](Self::write_u64_varint) with an 8-bit payload.
    fn write_u8_varint(&mut self, val: u8, chunk_length: usize) {
        write_variable_width(self, val.into(), chunk_length, 8);
    }

    /// Writes a signed value in block zigzag order, in `chunk_length`-bit
    /// chunks.
    ///
    /// # Panics
    ///
    /// Panics if `block_exponent` is 64 or more.
    fn write_i64_varint(&mut self, val: i64, chunk_length: usize, block_exponent: usize) {
        write_variable_width(self, zigzag_encode_block(val, block_exponent), chunk_length, 64);
    }

    /// Like [`write_i64_varint`](Self::write_i64_varint) with a 32-bit payload
    /// and `block_exponent` below 32.
    fn write_i32_varint(&mut self, val: i32, chunk_length: usize, block_exponent: usize) {
        assert!(block_exponent < 32);
        write_variable_width(
            self,
            zigzag_encode_block(val.into(), block_exponent),
            chunk_length,
            32,
        );
    }

    /// Like [`write_i64_varint`](Self::write_i64_varint) with a 16-bit payload
    /// and `block_exponent` below 16.
    fn write_i16_varint(&mut self, val: i16, chunk_length: usize, block_exponent: usize) {
        assert!(block_exponent < 16);
        write_variable_width(
            self,
            zigzag_encode_block(val.into(), block_exponent),
            chunk_length,
            16,
        );
    }

    /// Like [`write_i64_varint`](Self::write_i64_varint) with an 8-bit payload
    /// and `block_exponent` below 8.
    fn write_i8_varint(&mut self, val: i8, chunk_length: usize, block_exponent: usize) {
        assert!(block_exponent < 8);
        write_variable_width(
            self,
            zigzag_encode_block(val.into(), block_exponent),
            chunk_length,
            8,
        );
    }
}

/// A source of raw bit reads, with the variable-width codec layered on top.
pub trait BitRead {
    /// Reads up to `num_bits` bits from the stream.
    ///
    /// Returns the bits and the number actually read, which is less than
    /// `num_bits` only when the stream ends early. Reading short is
    /// truncation, not an error.
    ///
    /// # Panics
    ///
    /// Panics if `num_bits` is greater than 64.
    fn read_bits(&mut self, num_bits: usize) -> (u64, usize);

    /// Tests if the position has reached the total capacity of the stream.
    fn reached_end(&self) -> bool;

    /// Tests if nothing but trailing zero padding is left to read.
    ///
    /// May conservatively return false when only zeroes remain, but never
    /// returns true while a set bit is still ahead.
    fn only_zeroes_left(&self) -> bool {
        self.reached_end()
    }

    /// Reads up to `num_bits` bits as a left-to-right bit string.
    ///
    /// The string is shorter than `num_bits` if the stream ends early.
    fn read_bit_string(&mut self, num_bits: usize) -> String {
        let (bits, num_read) = self.read_bits(num_bits);
        bits_to_string(bits, num_read)
    }

    /// Reads a value written with [`BitWrite::write_u64_varint`].
    ///
    /// Returns `None` if the stream ends in the middle of the value; no
    /// partial value is ever produced. Reader and writer must agree on
    /// `chunk_length`.
    fn read_u64_varint(&mut self, chunk_length: usize) -> Option<u64> {
        read_variable_width(self, chunk_length, 64)
    }

    /// Reads a value written with [`BitWrite::write_u32_varint`].
    fn read_u32_varint(&mut self, chunk_length: usize) -> Option<u32> {
        read_variable_width(self, chunk_length, 32).map(|val| val as u32)
    }

    /// Reads a value written with [`BitWrite::write_u16_varint`].
    fn read_u16_varint(&mut self, chunk_length: usize) -> Option<u16> {
        read_variable_width(self, chunk_length, 16).map(|val| val as u16)
    }

    /// Reads a value written with [`BitWrite::write_u8_varint`].
    fn read_u8_varint(&mut self, chunk_length: usize) -> Option<u8> {
        read_variable_width(self, chunk_length, 8).map(|val| val as u8)
    }

    /// Reads a value written with [`BitWrite::write_i64_varint`] using the
    /// same `chunk_length` and `block_exponent`.
    fn read_i64_varint(&mut self, chunk_length: usize, block_exponent: usize) -> Option<i64> {
        let val = read_variable_width(self, chunk_length, 64)?;
        Some(zigzag_decode_block(val, block_exponent))
    }

    /// Reads a value written with [`BitWrite::write_i32_varint`].
    fn read_i32_varint(&mut self, chunk_length: usize, block_exponent: usize) -> Option<i32> {
        assert!(block_exponent < 32);
        let val = read_variable_width(self, chunk_length, 32)?;
        Some(zigzag_decode_block(val, block_exponent) as i32)
    }

    /// Reads a value written with [`BitWrite::write_i16_varint`].
    fn read_i16_varint(&mut self, chunk_length: usize, block_exponent: usize) -> Option<i16> {
        assert!(block_exponent < 16);
        let val = read_variable_width(self, chunk_length, 16)?;
        Some(zigzag_decode_block(val, block_exponent) as i16)
    }

    /// Reads a value written with [`BitWrite::write_i8_varint`].
    fn read_i8_varint(&mut self, chunk_length: usize, block_exponent: usize) -> Option<i8> {
        assert!(block_exponent < 8);
        let val = read_variable_width(self, chunk_length, 8)?;
        Some(zigzag_decode_block(val, block_exponent) as i8)
    }
}
