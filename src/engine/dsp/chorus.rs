use std::f32::consts::TAU;

/// Single-voice chorus: one short delay line with a sine-LFO-modulated tap
/// blended over the dry signal. Base delay ~3 ms, sweep up to +/-1.5 ms.
pub struct Chorus {
  buf: Vec<f32>,
  wr: usize,
  lfo_phase: f32,
  depth: f32,
  rate_hz: f32,
  sr: f32,
}

impl Chorus {
  pub fn new(sr: f32) -> Self {
    // ~8ms buffer leaves headroom above the deepest sweep
    let len = ((sr * 0.008) as usize).max(64);
    Self {
      buf: vec![0.0; len],
      wr: 0,
      lfo_phase: 0.0,
      depth: 0.0,
      rate_hz: 0.5,
      sr,
    }
  }

  pub fn set_depth(&mut self, depth: f32) {
    self.depth = depth.clamp(0.0, 1.0);
  }

  pub fn set_rate(&mut self, rate_hz: f32) {
    self.rate_hz = rate_hz.clamp(0.01, 10.0);
  }

  #[inline]
  fn read_interpolated(&self, delay_samples: f32) -> f32 {
    let len = self.buf.len();
    let d = delay_samples.clamp(1.0, (len - 2) as f32);
    let pos = (self.wr as f32 - d + len as f32) % len as f32;
    let i0 = pos.floor() as usize % len;
    let i1 = (i0 + 1) % len;
    let frac = pos.fract();
    self.buf[i0] * (1.0 - frac) + self.buf[i1] * frac
  }

  #[inline]
  pub fn process(&mut self, x: f32) -> f32 {
    self.buf[self.wr] = x;
    self.wr += 1;
    if self.wr >= self.buf.len() { self.wr = 0; }

    self.lfo_phase += self.rate_hz / self.sr;
    if self.lfo_phase >= 1.0 { self.lfo_phase -= 1.0; }
    let lfo = (self.lfo_phase * TAU).sin();

    let base = 0.003 * self.sr;
    let sweep = 0.0015 * self.sr * self.depth;
    let wet = self.read_interpolated(base + lfo * sweep);

    // subtle voicing: wet rides on top of the dry signal
    x + wet * self.depth * 0.7
  }
}
