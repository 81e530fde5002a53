use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SupportedStreamConfig, SupportedStreamConfigRange};
use thiserror::Error;

use crate::engine::params::Params;
use crate::engine::rig::{Rig, AUDIO_BLOCK_SIZE, SAMPLE_RATE};

/// Frames of input headroom between the capture and processing callbacks.
const RING_FRAMES: usize = 4096;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("no default {0} device")]
  NoDevice(&'static str),
  #[error("could not query stream configs: {0}")]
  Query(#[from] cpal::SupportedStreamConfigsError),
  #[error("no usable stereo f32 stream config")]
  NoConfig,
  #[error("failed to build stream: {0}")]
  Build(#[from] cpal::BuildStreamError),
  #[error("failed to start stream: {0}")]
  Play(#[from] cpal::PlayStreamError),
}

/// Owns the cpal streams. Capture pushes raw frames into a lock-free ring;
/// the output callback pops them, runs the rig, and never blocks or
/// allocates. All control state lives in the shared atomic `Params`.
pub struct AudioEngine {
  params: Arc<Params>,
  pub sr: f32,
  in_stream: Option<cpal::Stream>,
  out_stream: Option<cpal::Stream>,
}

impl AudioEngine {
  pub fn new(params: Arc<Params>) -> Self {
    Self { params, sr: SAMPLE_RATE, in_stream: None, out_stream: None }
  }

  pub fn params(&self) -> Arc<Params> { self.params.clone() }

  pub fn start(&mut self) -> Result<(), EngineError> {
    if self.out_stream.is_some() {
      return Ok(());
    }
    let host = cpal::default_host();
    let in_dev = host.default_input_device().ok_or(EngineError::NoDevice("input"))?;
    let out_dev = host.default_output_device().ok_or(EngineError::NoDevice("output"))?;

    let out_supported = pick_config(out_dev.supported_output_configs()?.collect())
      .ok_or(EngineError::NoConfig)?;
    let in_supported = pick_config(in_dev.supported_input_configs()?.collect())
      .ok_or(EngineError::NoConfig)?;

    let mut out_cfg: cpal::StreamConfig = out_supported.into();
    out_cfg.buffer_size = cpal::BufferSize::Fixed(AUDIO_BLOCK_SIZE);
    let mut in_cfg: cpal::StreamConfig = in_supported.into();
    in_cfg.sample_rate = out_cfg.sample_rate;
    in_cfg.buffer_size = cpal::BufferSize::Fixed(AUDIO_BLOCK_SIZE);
    self.sr = out_cfg.sample_rate.0 as f32;

    let (mut prod, mut cons) = rtrb::RingBuffer::<f32>::new(RING_FRAMES * 2);

    let in_stream = in_dev.build_input_stream(
      &in_cfg,
      move |data: &[f32], _: &cpal::InputCallbackInfo| {
        for &s in data {
          // full ring means the processor is behind; dropping is the only
          // non-blocking option
          let _ = prod.push(s);
        }
      },
      |e| log::error!("input stream error: {e}"),
      None,
    )?;

    // rig state moves into the output callback and stays there
    let mut rig = Rig::new(self.sr);
    let params = self.params.clone();
    let out_stream = out_dev.build_output_stream(
      &out_cfg,
      move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        for frame in data.chunks_mut(2) {
          let l = cons.pop().unwrap_or(0.0);
          let r = cons.pop().unwrap_or(0.0);
          let (ol, or) = rig.process_frame(l, r, &params);
          frame[0] = ol;
          if frame.len() > 1 { frame[1] = or; }
        }
      },
      |e| log::error!("output stream error: {e}"),
      None,
    )?;

    in_stream.play()?;
    out_stream.play()?;
    self.in_stream = Some(in_stream);
    self.out_stream = Some(out_stream);
    Ok(())
  }

  pub fn stop(&mut self) {
    self.in_stream.take();
    self.out_stream.take();
  }
}

/// Prefer the reference rate at stereo f32, otherwise any stereo f32 config
/// at its top rate.
fn pick_config(ranges: Vec<SupportedStreamConfigRange>) -> Option<SupportedStreamConfig> {
  let sr = SAMPLE_RATE as u32;
  for r in &ranges {
    if r.channels() != 2 || r.sample_format() != SampleFormat::F32 {
      continue;
    }
    if r.min_sample_rate().0 <= sr && r.max_sample_rate().0 >= sr {
      return Some(r.clone().with_sample_rate(cpal::SampleRate(sr)));
    }
  }
  ranges
    .into_iter()
    .find(|r| r.channels() == 2 && r.sample_format() == SampleFormat::F32)
    .map(|r| r.with_max_sample_rate())
}
