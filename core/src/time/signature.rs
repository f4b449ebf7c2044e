#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
  num_beats: u16,  // numerator
  note_value: u16, // denominator
}

impl Signature {
  pub fn new(num_beats: u16, note_value: u16) -> Signature {
    Signature {
      num_beats,
      note_value,
    }
  }

  /// Signature from a time-signature meta payload: the numerator as is and
  /// the denominator as a power of two. Returns `None` when the exponent
  /// does not fit a `u16` denominator.
  pub fn from_meta(num_beats: u8, note_value_pow: u8) -> Option<Signature> {
    1u16
      .checked_shl(u32::from(note_value_pow))
      .map(|note_value| Signature::new(u16::from(num_beats), note_value))
  }

  pub fn get_num_beats(&self) -> u16 {
    self.num_beats
  }

  pub fn get_note_value(&self) -> u16 {
    self.note_value
  }
}

impl Default for Signature {
  fn default() -> Signature {
    Signature::new(4, 4)
  }
}
