use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

// Parameter words are single-writer (the control path) and read per-sample by
// the audio callback. Each value fits one atomic word, so relaxed loads and
// stores are enough; there are no cross-field invariants to order.

pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
  pub fn new(v: f32) -> Self { Self(AtomicU32::new(v.to_bits())) }
  #[inline]
  pub fn get(&self) -> f32 { f32::from_bits(self.0.load(Ordering::Relaxed)) }
  #[inline]
  pub fn set(&self, v: f32) { self.0.store(v.to_bits(), Ordering::Relaxed); }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FilterMode {
  Lowpass = 0,
  Bandpass = 1,
  Highpass = 2,
}

impl FilterMode {
  pub fn from_index(i: i32) -> Option<Self> {
    match i {
      0 => Some(FilterMode::Lowpass),
      1 => Some(FilterMode::Bandpass),
      2 => Some(FilterMode::Highpass),
      _ => None,
    }
  }
}

pub struct ChannelParams {
  pub gain: AtomicF32,
  pub drive: AtomicF32,
  pub filter_freq: AtomicF32,
  pub filter_res: AtomicF32,
  filter_mode: AtomicU8,
  pub delay_time: AtomicF32,
  pub delay_feedback: AtomicF32,
  pub delay_mix: AtomicF32,
  pub chorus_depth: AtomicF32,
  pub chorus_rate: AtomicF32,
}

impl ChannelParams {
  fn new() -> Self {
    Self {
      gain: AtomicF32::new(1.0),
      drive: AtomicF32::new(0.0),
      filter_freq: AtomicF32::new(10_000.0),
      filter_res: AtomicF32::new(0.1),
      filter_mode: AtomicU8::new(FilterMode::Lowpass as u8),
      delay_time: AtomicF32::new(0.0),
      delay_feedback: AtomicF32::new(0.0),
      delay_mix: AtomicF32::new(0.0),
      chorus_depth: AtomicF32::new(0.0),
      chorus_rate: AtomicF32::new(0.5),
    }
  }

  #[inline]
  pub fn filter_mode(&self) -> FilterMode {
    match self.filter_mode.load(Ordering::Relaxed) {
      1 => FilterMode::Bandpass,
      2 => FilterMode::Highpass,
      _ => FilterMode::Lowpass,
    }
  }

  fn set_filter_mode(&self, mode: FilterMode) {
    self.filter_mode.store(mode as u8, Ordering::Relaxed);
  }
}

/// The live control snapshot shared between the control path (writer) and the
/// audio callback (reader). Values are clamped here, at the single write
/// site, so the audio path never has to re-validate.
pub struct Params {
  pub ch: [ChannelParams; 2],
  pub cross_mod: AtomicF32,
  pub cross_bleed: AtomicF32,
  pub stereo_width: AtomicF32,
  pub reverb_mix: AtomicF32,
  pub reverb_time: AtomicF32,
  pub master_gain: AtomicF32,
}

impl Default for Params {
  fn default() -> Self { Self::new() }
}

impl Params {
  pub fn new() -> Self {
    Self {
      ch: [ChannelParams::new(), ChannelParams::new()],
      cross_mod: AtomicF32::new(0.0),
      cross_bleed: AtomicF32::new(0.0),
      stereo_width: AtomicF32::new(1.0),
      reverb_mix: AtomicF32::new(0.0),
      reverb_time: AtomicF32::new(0.5),
      master_gain: AtomicF32::new(1.0),
    }
  }

  /// Apply one named control value. Returns false for unknown names and for
  /// non-finite values; the stored value is always clamped into the
  /// parameter's range.
  pub fn set(&self, name: &str, val: f32) -> bool {
    // clamp cannot repair NaN/Inf, so they must never reach a store
    if !val.is_finite() {
      return false;
    }
    // ch1_* / ch2_* route into the per-channel block
    if let Some(rest) = name.strip_prefix("ch1_") {
      return self.set_channel(0, rest, val);
    }
    if let Some(rest) = name.strip_prefix("ch2_") {
      return self.set_channel(1, rest, val);
    }
    match name {
      "cross_mod" => self.cross_mod.set(val.clamp(0.0, 1.0)),
      "cross_bleed" => self.cross_bleed.set(val.clamp(0.0, 1.0)),
      "stereo_width" => self.stereo_width.set(val.clamp(0.0, 2.0)),
      "reverb_mix" => self.reverb_mix.set(val.clamp(0.0, 1.0)),
      "reverb_time" => self.reverb_time.set(val.clamp(0.0, 1.0)),
      "master_gain" => self.master_gain.set(val.clamp(0.0, 2.0)),
      _ => return false,
    }
    true
  }

  fn set_channel(&self, idx: usize, field: &str, val: f32) -> bool {
    let ch = &self.ch[idx];
    match field {
      "gain" => ch.gain.set(val.clamp(0.0, 2.0)),
      "drive" => ch.drive.set(val.clamp(0.0, 1.0)),
      "filter_freq" => ch.filter_freq.set(val.clamp(20.0, 20_000.0)),
      "filter_res" => ch.filter_res.set(val.clamp(0.0, 1.0)),
      "filter_mode" => {
        // Truncate and accept only a valid mode index; otherwise keep the
        // current mode.
        if let Some(mode) = FilterMode::from_index(val as i32) {
          ch.set_filter_mode(mode);
        }
      }
      "delay_time" => ch.delay_time.set(val.clamp(0.0, 1.0)),
      "delay_fb" => ch.delay_feedback.set(val.clamp(0.0, 0.95)),
      "delay_mix" => ch.delay_mix.set(val.clamp(0.0, 1.0)),
      "chorus_depth" => ch.chorus_depth.set(val.clamp(0.0, 1.0)),
      "chorus_rate" => ch.chorus_rate.set(val.clamp(0.01, 10.0)),
      _ => return false,
    }
    true
  }
}
