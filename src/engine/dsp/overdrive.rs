/// Tanh waveshaper with drive-dependent pre-gain and rough level makeup.
/// More drive means more pre-gain into the shaper, so harmonic content rises
/// monotonically with the drive amount.
pub struct Overdrive {
  pre: f32,
  post: f32,
}

impl Overdrive {
  pub fn new() -> Self {
    let mut od = Self { pre: 1.0, post: 1.0 };
    od.set_drive(0.0);
    od
  }

  pub fn set_drive(&mut self, amount: f32) {
    let a = amount.clamp(0.0, 1.0);
    // squared taper keeps the low end of the knob gentle
    self.pre = 1.0 + a * a * 15.0;
    self.post = 1.0 / (1.0 + a * 0.4);
  }

  #[inline]
  pub fn process(&mut self, x: f32) -> f32 {
    (x * self.pre).tanh() * self.post
  }
}

impl Default for Overdrive {
  fn default() -> Self { Self::new() }
}
