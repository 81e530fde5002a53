/// Fixed-capacity circular delay line. Capacity is set once at construction;
/// the audio path only reads taps and writes samples, never allocates.
pub struct DelayLine {
  buf: Vec<f32>,
  wr: usize,
}

impl DelayLine {
  pub fn new(max_samples: usize) -> Self {
    Self { buf: vec![0.0; max_samples.max(1)], wr: 0 }
  }

  pub fn capacity(&self) -> usize { self.buf.len() }

  /// Tap the line `offset` samples behind the write head. Offsets beyond the
  /// capacity wrap onto it.
  #[inline]
  pub fn read(&self, offset: usize) -> f32 {
    let len = self.buf.len();
    let off = offset % len;
    let idx = (self.wr + len - off) % len;
    self.buf[idx]
  }

  #[inline]
  pub fn write(&mut self, x: f32) {
    self.buf[self.wr] = x;
    self.wr += 1;
    if self.wr >= self.buf.len() { self.wr = 0; }
  }

  pub fn reset(&mut self) {
    self.buf.fill(0.0);
    self.wr = 0;
  }
}
