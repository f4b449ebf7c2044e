//! Big-endian byte cursor used by the sequence decoder.
//!
//! Reads never panic: a read that would go past the end of the data returns
//! `Err(position)` with the position where it failed, leaving the cursor
//! untouched.

pub struct ByteReader<'a> {
  data: &'a [u8],
  pos: usize,
}

impl<'a> ByteReader<'a> {
  pub fn new(data: &'a [u8]) -> ByteReader<'a> {
    ByteReader { data, pos: 0 }
  }

  pub fn position(&self) -> usize {
    self.pos
  }

  pub fn remaining(&self) -> usize {
    self.data.len() - self.pos
  }

  pub fn is_empty(&self) -> bool {
    self.remaining() == 0
  }

  pub fn read_u8(&mut self) -> Result<u8, usize> {
    match self.data.get(self.pos) {
      Some(byte) => {
        self.pos += 1;
        Ok(*byte)
      }
      None => Err(self.pos),
    }
  }

  pub fn read_u16(&mut self) -> Result<u16, usize> {
    self
      .read_slice(2)
      .map(|bytes| u16::from_be_bytes([bytes[0], bytes[1]]))
  }

  pub fn read_u32(&mut self) -> Result<u32, usize> {
    self
      .read_slice(4)
      .map(|bytes| u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
  }

  pub fn read_tag(&mut self) -> Result<[u8; 4], usize> {
    self
      .read_slice(4)
      .map(|bytes| [bytes[0], bytes[1], bytes[2], bytes[3]])
  }

  pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], usize> {
    if len <= self.remaining() {
      let slice = &self.data[self.pos..self.pos + len];
      self.pos += len;
      Ok(slice)
    } else {
      Err(self.pos)
    }
  }

  pub fn skip(&mut self, len: usize) -> Result<(), usize> {
    self.read_slice(len).map(|_| ())
  }

  /// Splits off the next `len` bytes as an independent reader.
  pub fn sub_reader(&mut self, len: usize) -> Result<ByteReader<'a>, usize> {
    self.read_slice(len).map(ByteReader::new)
  }

  /// Reads a variable-length quantity: 7 bits per byte, most significant
  /// first, continuing while the high bit is set. The length is bounded only
  /// by the data; bits shifted out of the 32-bit accumulator are dropped.
  pub fn read_variable_length(&mut self) -> Result<u32, usize> {
    let start = self.pos;
    let mut value = 0u32;
    loop {
      let byte = match self.read_u8() {
        Ok(byte) => byte,
        Err(pos) => {
          self.pos = start;
          return Err(pos);
        }
      };
      value = (value << 7) | u32::from(byte & 0x7f);
      if byte & 0x80 == 0 {
        return Ok(value);
      }
    }
  }
}

/// Number of bytes used by the shortest variable-length encoding of `value`.
pub fn variable_length_size(value: u32) -> usize {
  let mut size = 1;
  let mut rest = value >> 7;
  while rest != 0 {
    size += 1;
    rest >>= 7;
  }
  size
}

/// Appends the shortest variable-length encoding of `value` to `out`.
pub fn write_variable_length(value: u32, out: &mut Vec<u8>) {
  let size = variable_length_size(value);
  for i in (0..size).rev() {
    let group = ((value >> (7 * i)) & 0x7f) as u8;
    if i > 0 {
      out.push(group | 0x80);
    } else {
      out.push(group);
    }
  }
}
