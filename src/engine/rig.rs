use crate::engine::dsp::{Chorus, DelayLine, Overdrive, Svf};
use crate::engine::params::{ChannelParams, FilterMode, Params};

/// Reference sample rate of the device configuration.
pub const SAMPLE_RATE: f32 = 48_000.0;
/// Requested frames per callback; small for low control latency.
pub const AUDIO_BLOCK_SIZE: u32 = 48;
/// Delay line capacity in seconds.
pub const MAX_DELAY_SECS: f32 = 1.0;
/// Full-scale cross-modulation excursion applied to the filter cutoff.
const CROSS_MOD_FREQ_RANGE: f32 = 5_000.0;

#[inline]
fn sanitize(x: f32) -> f32 {
  if x.is_finite() { x } else { 0.0 }
}

/// Cubic soft clip: identity-like with smooth compression for |x| <= 1,
/// hard-limited beyond.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
  if x > 1.0 { return 1.0; }
  if x < -1.0 { return -1.0; }
  x - (x * x * x) / 3.0
}

/// Cross-bleed then mid-side width, both computed from the incoming pair.
/// Width 1.0 with bleed 0.0 is the identity.
#[inline]
pub fn cross_mix(l: f32, r: f32, bleed: f32, width: f32) -> (f32, f32) {
  let (l, r) = if bleed > 0.0 {
    // both sides read pre-bleed values
    (l * (1.0 - bleed) + r * bleed, r * (1.0 - bleed) + l * bleed)
  } else {
    (l, r)
  };
  let mid = (l + r) * 0.5;
  let side = (l - r) * 0.5 * width;
  (mid + side, mid - side)
}

/// Stand-in for a real reverberator: a single scaled self-tap. Not spectrally
/// accurate; kept deliberately until a proper reverb lands.
#[inline]
pub fn reverb_placeholder(x: f32, mix: f32, time: f32) -> f32 {
  if mix > 0.0 {
    x * (1.0 - mix) + x * mix * time
  } else {
    x
  }
}

/// One channel's effect chain: gain -> drive -> cross-modulated filter ->
/// delay -> chorus. Owns all of its primitive state; nothing is shared with
/// the other channel.
pub struct ChannelStrip {
  drive: Overdrive,
  filter: Svf,
  delay: DelayLine,
  chorus: Chorus,
}

impl ChannelStrip {
  pub fn new(sr: f32) -> Self {
    Self {
      drive: Overdrive::new(),
      filter: Svf::new(sr),
      delay: DelayLine::new((sr * MAX_DELAY_SECS).ceil() as usize),
      chorus: Chorus::new(sr),
    }
  }

  /// Process one sanitized input sample. `other_in` is the other channel's
  /// raw (pre-processing) input, used only to modulate this channel's filter
  /// cutoff.
  #[inline]
  pub fn process(&mut self, x: f32, other_in: f32, p: &ChannelParams, cross_mod: f32) -> f32 {
    let mut s = x * p.gain.get();

    self.drive.set_drive(p.drive.get());
    s = self.drive.process(s);

    let mut freq = p.filter_freq.get();
    if cross_mod > 0.0 {
      freq += other_in * cross_mod * CROSS_MOD_FREQ_RANGE;
      freq = freq.clamp(20.0, 20_000.0);
    }
    self.filter.set_params(freq, p.filter_res.get());
    let outs = self.filter.process(s);
    s = match p.filter_mode() {
      FilterMode::Lowpass => outs.low,
      FilterMode::Bandpass => outs.band,
      FilterMode::Highpass => outs.high,
    };

    let mix = p.delay_mix.get();
    if mix > 0.0 {
      let offset = (p.delay_time.get() * self.delay.capacity() as f32) as usize;
      let delayed = self.delay.read(offset);
      self.delay.write(s + delayed * p.delay_feedback.get());
      s = s * (1.0 - mix) + delayed * mix;
    } else {
      // keep the line primed so enabling the delay later has history
      self.delay.write(s);
    }

    let depth = p.chorus_depth.get();
    if depth > 0.0 {
      self.chorus.set_depth(depth);
      self.chorus.set_rate(p.chorus_rate.get());
      s = self.chorus.process(s);
    }

    s
  }
}

/// The full dual-channel rig: two strips, cross mixer, and output stage,
/// consulting the live parameter store once per sample.
pub struct Rig {
  strips: [ChannelStrip; 2],
}

impl Rig {
  pub fn new(sr: f32) -> Self {
    Self { strips: [ChannelStrip::new(sr), ChannelStrip::new(sr)] }
  }

  #[inline]
  pub fn process_frame(&mut self, in_l: f32, in_r: f32, params: &Params) -> (f32, f32) {
    // sanitize before anything else so the cross-mod feed is clean too
    let in_l = sanitize(in_l);
    let in_r = sanitize(in_r);

    let cross_mod = params.cross_mod.get();
    let l = self.strips[0].process(in_l, in_r, &params.ch[0], cross_mod);
    let r = self.strips[1].process(in_r, in_l, &params.ch[1], cross_mod);

    let (l, r) = cross_mix(l, r, params.cross_bleed.get(), params.stereo_width.get());

    let mix = params.reverb_mix.get();
    let time = params.reverb_time.get();
    let l = reverb_placeholder(l, mix, time);
    let r = reverb_placeholder(r, mix, time);

    let master = params.master_gain.get();
    let l = sanitize(soft_clip(l * master));
    let r = sanitize(soft_clip(r * master));
    (l, r)
  }

  /// Render a block of interleaved stereo frames in place.
  pub fn process_block(&mut self, io: &mut [f32], params: &Params) {
    for frame in io.chunks_exact_mut(2) {
      let (l, r) = self.process_frame(frame[0], frame[1], params);
      frame[0] = l;
      frame[1] = r;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_relative_eq;

  fn test_signal(n: usize) -> f32 {
    // deterministic, bounded, non-periodic-ish
    (n as f32 * 0.37).sin() * 0.6 + (n as f32 * 0.11).cos() * 0.3
  }

  #[test]
  fn width_unity_is_identity() {
    for n in 0..100 {
      let l = test_signal(n);
      let r = test_signal(n + 7);
      let (ol, or) = cross_mix(l, r, 0.0, 1.0);
      assert_relative_eq!(ol, l, epsilon = 1e-6);
      assert_relative_eq!(or, r, epsilon = 1e-6);
    }
  }

  #[test]
  fn width_zero_collapses_to_mono() {
    let (l, r) = cross_mix(0.8, -0.4, 0.0, 0.0);
    assert_relative_eq!(l, 0.2, epsilon = 1e-6);
    assert_relative_eq!(r, 0.2, epsilon = 1e-6);
  }

  #[test]
  fn full_bleed_swaps_channels() {
    let (l, r) = cross_mix(0.5, -0.25, 1.0, 1.0);
    assert_relative_eq!(l, -0.25, epsilon = 1e-6);
    assert_relative_eq!(r, 0.5, epsilon = 1e-6);
  }

  #[test]
  fn reverb_placeholder_blend() {
    let x = 0.5;
    assert_eq!(reverb_placeholder(x, 0.0, 0.7), x);
    let y = reverb_placeholder(x, 0.4, 0.5);
    assert_relative_eq!(y, x * 0.6 + x * 0.4 * 0.5, epsilon = 1e-6);
  }

  #[test]
  fn soft_clip_limits_and_preserves_shape() {
    assert_eq!(soft_clip(5.0), 1.0);
    assert_eq!(soft_clip(-5.0), -1.0);
    assert_relative_eq!(soft_clip(0.1), 0.1 - 0.001 / 3.0, epsilon = 1e-6);
    // monotonic over the smooth region
    let mut prev = soft_clip(-1.0);
    let mut x = -1.0;
    while x < 1.0 {
      x += 0.05;
      let y = soft_clip(x);
      assert!(y >= prev);
      prev = y;
    }
  }

  #[test]
  fn output_finite_for_hostile_input() {
    let params = Params::new();
    params.set("master_gain", 2.0);
    params.set("ch1_drive", 1.0);
    params.set("ch2_delay_mix", 1.0);
    params.set("ch2_delay_fb", 0.95);
    params.set("reverb_mix", 1.0);
    let mut rig = Rig::new(48_000.0);
    let hostile = [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 1e30, -1e30, 0.5];
    for n in 0..1000 {
      let l_in = hostile[n % hostile.len()];
      let r_in = hostile[(n + 3) % hostile.len()];
      let (l, r) = rig.process_frame(l_in, r_in, &params);
      assert!(l.is_finite() && r.is_finite());
      assert!((-1.0..=1.0).contains(&l));
      assert!((-1.0..=1.0).contains(&r));
    }
  }

  #[test]
  fn channel_survives_nan_parameter_command() {
    use crate::engine::control::apply_command;
    // a nan value must never reach the store, so the filter state stays
    // clean and the channel keeps producing signal
    let params = Params::new();
    assert!(!apply_command("ch1_filter_freq:nan", &params));
    let mut rig = Rig::new(48_000.0);
    let mut alive = false;
    for n in 0..256 {
      let (l, r) = rig.process_frame(test_signal(n), 0.0, &params);
      assert!(l.is_finite() && r.is_finite());
      if l.abs() > 1e-6 { alive = true; }
    }
    assert!(alive);
    // and the parameter remains repairable
    assert!(apply_command("ch1_filter_freq:2000", &params));
    assert_eq!(params.ch[0].filter_freq.get(), 2000.0);
  }

  #[test]
  fn delay_settings_ignored_while_mix_is_zero() {
    let a_params = Params::new();
    a_params.set("ch1_delay_time", 0.3);
    a_params.set("ch1_delay_fb", 0.9);
    let b_params = Params::new();
    let mut a = ChannelStrip::new(48_000.0);
    let mut b = ChannelStrip::new(48_000.0);
    for n in 0..2000 {
      let x = test_signal(n);
      let ya = a.process(x, 0.0, &a_params.ch[0], 0.0);
      let yb = b.process(x, 0.0, &b_params.ch[0], 0.0);
      assert_eq!(ya, yb);
    }
  }

  #[test]
  fn delay_buffer_stays_live_while_bypassed() {
    // run with mix 0 so only the dry path is audible, then enable the delay
    // and check that previously written history plays back
    let params = Params::new();
    params.set("ch1_delay_time", 48.0 / 48_000.0); // 48-sample tap
    let mut strip = ChannelStrip::new(48_000.0);
    for n in 0..100 {
      strip.process(test_signal(n), 0.0, &params.ch[0], 0.0);
    }
    params.set("ch1_delay_mix", 1.0);
    // with mix 1 the output is exactly the delayed tap; it must be nonzero
    // because the bypassed phase kept writing
    let mut any_nonzero = false;
    for n in 100..110 {
      let y = strip.process(test_signal(n), 0.0, &params.ch[0], 0.0);
      if y.abs() > 1e-6 { any_nonzero = true; }
    }
    assert!(any_nonzero);
  }

  #[test]
  fn filter_mode_switch_does_not_disturb_state() {
    let a_params = Params::new();
    let b_params = Params::new();
    let mut a = ChannelStrip::new(48_000.0);
    let mut b = ChannelStrip::new(48_000.0);
    for n in 0..64 {
      let x = test_signal(n);
      assert_eq!(
        a.process(x, 0.0, &a_params.ch[0], 0.0),
        b.process(x, 0.0, &b_params.ch[0], 0.0)
      );
    }
    // flip A to highpass for a stretch, then back; selection changes but the
    // filter state keeps evolving identically
    a_params.set("ch1_filter_mode", 2.0);
    for n in 64..96 {
      let x = test_signal(n);
      a.process(x, 0.0, &a_params.ch[0], 0.0);
      b.process(x, 0.0, &b_params.ch[0], 0.0);
    }
    a_params.set("ch1_filter_mode", 0.0);
    for n in 96..160 {
      let x = test_signal(n);
      assert_eq!(
        a.process(x, 0.0, &a_params.ch[0], 0.0),
        b.process(x, 0.0, &b_params.ch[0], 0.0)
      );
    }
  }

  #[test]
  fn cross_mod_shifts_cutoff_only_when_enabled() {
    // with cross_mod 0 the other channel's input is irrelevant
    let params = Params::new();
    let mut a = ChannelStrip::new(48_000.0);
    let mut b = ChannelStrip::new(48_000.0);
    for n in 0..256 {
      let x = test_signal(n);
      let ya = a.process(x, 0.9, &params.ch[0], 0.0);
      let yb = b.process(x, -0.9, &params.ch[0], 0.0);
      assert_eq!(ya, yb);
    }
    // with cross_mod on, differing cross feeds diverge the outputs
    let mut diverged = false;
    for n in 0..256 {
      let x = test_signal(n);
      let ya = a.process(x, 0.9, &params.ch[0], 1.0);
      let yb = b.process(x, -0.9, &params.ch[0], 1.0);
      if (ya - yb).abs() > 1e-9 { diverged = true; }
    }
    assert!(diverged);
  }

  #[test]
  fn process_block_matches_per_frame() {
    let params = Params::new();
    params.set("ch1_drive", 0.5);
    params.set("stereo_width", 1.5);
    let mut blk = Rig::new(48_000.0);
    let mut ref_rig = Rig::new(48_000.0);
    let mut io: Vec<f32> = (0..96).map(|n| test_signal(n)).collect();
    let expected: Vec<f32> = io
      .chunks_exact(2)
      .flat_map(|f| {
        let (l, r) = ref_rig.process_frame(f[0], f[1], &params);
        [l, r]
      })
      .collect();
    blk.process_block(&mut io, &params);
    assert_eq!(io, expected);
  }
}
