//! Bit-packed palette index arrays, as stored in chunk section `data` longs.
//!
//! Entries are packed low-bits-first into 64-bit words and never span two
//! words; the unused high bits of each word are wasted. The entry width is
//! not stored anywhere, it is derived from the palette length.

/// Number of blocks along each axis of a section.
pub const SECTION_SIZE: usize = 16;
/// Total block count in one section.
pub const SECTION_VOLUME: usize = SECTION_SIZE * SECTION_SIZE * SECTION_SIZE;

/// Bits per palette entry: `max(4, ceil(log2(palette_len)))`.
pub fn bits_per_entry(palette_len: usize) -> usize {
    let raw = if palette_len <= 1 {
        0
    } else {
        (usize::BITS - (palette_len - 1).leading_zeros()) as usize
    };
    raw.max(4)
}

/// Linear index of a section-local position. YZX order: y outermost, x innermost.
#[inline]
pub const fn section_index(x: usize, y: usize, z: usize) -> usize {
    y * SECTION_SIZE * SECTION_SIZE + z * SECTION_SIZE + x
}

#[inline]
const fn entries_per_word(bits: usize) -> usize {
    64 / bits
}

#[inline]
const fn mask(bits: usize) -> u64 {
    (1u64 << bits) - 1
}

/// Words needed to hold `count` entries of `bits` each.
pub const fn packed_len(count: usize, bits: usize) -> usize {
    count.div_ceil(entries_per_word(bits))
}

/// Read entry `index`, or `None` if its word lies past the end of `words`.
pub fn try_unpack(words: &[i64], index: usize, bits: usize) -> Option<u64> {
    let per_word = entries_per_word(bits);
    let word = *words.get(index / per_word)?;
    let bit_offset = (index % per_word) * bits;
    Some((word as u64 >> bit_offset) & mask(bits))
}

/// Read entry `index`. A word past the end of `words` reads as 0, so
/// truncated data resolves to the first palette entry instead of failing.
#[inline]
pub fn unpack(words: &[i64], index: usize, bits: usize) -> u64 {
    try_unpack(words, index, bits).unwrap_or(0)
}

/// Pack `indices` into words, `bits` per entry. Values wider than `bits` are
/// truncated to their low bits.
pub fn pack(indices: &[u16], bits: usize) -> Vec<i64> {
    let per_word = entries_per_word(bits);
    let mask = mask(bits);

    let mut words = vec![0i64; packed_len(indices.len(), bits)];
    for (i, &idx) in indices.iter().enumerate() {
        let bit_offset = (i % per_word) * bits;
        words[i / per_word] |= ((idx as u64 & mask) << bit_offset) as i64;
    }
    words
}
