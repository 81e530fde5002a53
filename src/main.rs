use std::io::Read;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use crossbeam_channel::{bounded, RecvTimeoutError};

use stereorig::engine::audio::AudioEngine;
use stereorig::engine::control::{apply_command, CommandAccumulator};
use stereorig::engine::params::Params;
use stereorig::engine::rig::AUDIO_BLOCK_SIZE;

fn main() -> anyhow::Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  let params = Arc::new(Params::new());
  let mut engine = AudioEngine::new(params.clone());
  engine.start().context("failed to start audio engine")?;
  log::info!(
    "audio running at {} Hz ({AUDIO_BLOCK_SIZE}-frame blocks); send name:value lines on stdin",
    engine.sr
  );

  // Transport receive path: raw stdin bytes go over a channel so the control
  // loop below stays a plain cooperative poll with no blocking reads.
  let (tx, rx) = bounded::<Vec<u8>>(64);
  thread::spawn(move || {
    let mut stdin = std::io::stdin().lock();
    let mut chunk = [0u8; 256];
    loop {
      match stdin.read(&mut chunk) {
        Ok(0) => break,
        Ok(n) => {
          if tx.send(chunk[..n].to_vec()).is_err() {
            break;
          }
        }
        Err(e) => {
          log::error!("control read failed: {e}");
          break;
        }
      }
    }
  });

  let mut acc = CommandAccumulator::new();
  loop {
    match rx.recv_timeout(Duration::from_millis(1)) {
      Ok(bytes) => {
        for b in bytes {
          acc.push(b);
          if let Some(line) = acc.take_line() {
            apply_command(line, &params);
          }
        }
      }
      Err(RecvTimeoutError::Timeout) => {}
      Err(RecvTimeoutError::Disconnected) => {
        log::info!("control channel closed; audio keeps running");
        break;
      }
    }
  }

  // keep the streams alive after the control channel is gone
  loop {
    thread::sleep(Duration::from_secs(3600));
  }
}
