use byteorder::{BigEndian, ByteOrder};

use crate::error::{FormatError, Result};

/// Big-endian cursor over a byte slice that reports truncation with the
/// offset and the name of the field being read.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Allocation hint for `count` items of at least `min_item_bytes` each,
    /// bounded by what the remaining input could actually hold.
    pub fn capacity_for(&self, count: usize, min_item_bytes: usize) -> usize {
        count.min(self.remaining() / min_item_bytes.max(1))
    }

    pub fn bytes(&mut self, len: usize, what: &'static str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(FormatError::Truncated {
                what,
                offset: self.position(),
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize, what: &'static str) -> Result<()> {
        self.bytes(len, what).map(|_| ())
    }

    pub fn u8(&mut self, what: &'static str) -> Result<u8> {
        Ok(self.bytes(1, what)?[0])
    }

    pub fn u16(&mut self, what: &'static str) -> Result<u16> {
        Ok(BigEndian::read_u16(self.bytes(2, what)?))
    }

    pub fn u32(&mut self, what: &'static str) -> Result<u32> {
        Ok(BigEndian::read_u32(self.bytes(4, what)?))
    }

    pub fn i32(&mut self, what: &'static str) -> Result<i32> {
        Ok(BigEndian::read_i32(self.bytes(4, what)?))
    }

    /// A length or count field. Negative values are an error.
    pub fn length(&mut self, what: &'static str) -> Result<usize> {
        let len = self.i32(what)?;
        usize::try_from(len).map_err(|_| FormatError::NegativeLength { what, len })
    }

    /// A length-prefixed block. A zero or negative length is an empty block.
    pub fn sized(&mut self, what: &'static str) -> Result<&'a [u8]> {
        let len = self.i32(what)?;
        if len <= 0 {
            return Ok(&[]);
        }
        self.bytes(len as usize, what)
    }

    /// Skip a length-prefixed block, returning how many payload bytes it had.
    pub fn skip_sized(&mut self, what: &'static str) -> Result<usize> {
        self.sized(what).map(<[u8]>::len)
    }
}
