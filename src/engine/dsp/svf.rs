use std::f32::consts::PI;

/// One set of simultaneous filter responses for a single input sample.
#[derive(Clone, Copy, Debug)]
pub struct SvfOutputs {
  pub low: f32,
  pub band: f32,
  pub high: f32,
}

/// Trapezoidal-integrator state-variable filter. Every call produces the
/// lowpass, bandpass and highpass responses at once; callers pick the one
/// they want without affecting the state evolution.
#[derive(Clone)]
pub struct Svf {
  ic1eq: f32,
  ic2eq: f32,
  g: f32,
  k: f32,
  sr: f32,
}

impl Svf {
  pub fn new(sr: f32) -> Self {
    Self { ic1eq: 0.0, ic2eq: 0.0, g: 0.1, k: 2.0, sr }
  }

  /// `res` in 0..1 maps onto damping; 0 is gentle, 1 is strongly resonant
  /// without reaching self-oscillation.
  pub fn set_params(&mut self, cutoff_hz: f32, res: f32) {
    let fc = (cutoff_hz / self.sr).clamp(1e-5, 0.49);
    self.g = (PI * fc).tan();
    self.k = 2.0 - 1.9 * res.clamp(0.0, 1.0);
  }

  #[inline]
  pub fn process(&mut self, x: f32) -> SvfOutputs {
    let g = self.g;
    let k = self.k;
    let v1 = (self.ic1eq + g * (x - self.ic2eq)) / (1.0 + g * (g + k));
    let v2 = self.ic2eq + g * v1;
    self.ic1eq = 2.0 * v1 - self.ic1eq;
    self.ic2eq = 2.0 * v2 - self.ic2eq;
    let low = v2;
    let band = v1;
    let high = x - k * band - low;
    SvfOutputs { low, band, high }
  }

  pub fn reset(&mut self) {
    self.ic1eq = 0.0;
    self.ic2eq = 0.0;
  }
}
