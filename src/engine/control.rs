use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::params::Params;

/// Accumulation buffer capacity; longer unterminated lines reset silently.
pub const MAX_LINE: usize = 128;
/// Longest accepted parameter name.
pub const MAX_NAME: usize = 63;

/// Bounded byte accumulator for the control channel. Bytes arrive from the
/// transport's receive path; a terminator (`\n` or `;`) commits the line and
/// immediately resets the cursor, so the next byte starts a fresh command
/// before the committed one is consumed. Overflow drops the partial line.
///
/// The ready flag is release/acquire so a consumer running in a different
/// context than the receive path observes the committed bytes.
pub struct CommandAccumulator {
  buf: [u8; MAX_LINE],
  cursor: usize,
  line: [u8; MAX_LINE],
  line_len: usize,
  ready: AtomicBool,
}

impl Default for CommandAccumulator {
  fn default() -> Self { Self::new() }
}

impl CommandAccumulator {
  pub fn new() -> Self {
    Self {
      buf: [0; MAX_LINE],
      cursor: 0,
      line: [0; MAX_LINE],
      line_len: 0,
      ready: AtomicBool::new(false),
    }
  }

  /// Feed one byte from the transport.
  pub fn push(&mut self, byte: u8) {
    if byte == b'\n' || byte == b';' {
      self.line[..self.cursor].copy_from_slice(&self.buf[..self.cursor]);
      self.line_len = self.cursor;
      self.cursor = 0;
      self.ready.store(true, Ordering::Release);
    } else if self.cursor < MAX_LINE {
      self.buf[self.cursor] = byte;
      self.cursor += 1;
    } else {
      // overflow: drop the byte and the truncated prefix
      self.cursor = 0;
    }
  }

  /// Take the committed line if one is pending. Clears the ready flag first;
  /// non-UTF-8 lines are dropped like any other malformed command.
  pub fn take_line(&mut self) -> Option<&str> {
    if self.ready.swap(false, Ordering::Acquire) {
      std::str::from_utf8(&self.line[..self.line_len]).ok()
    } else {
      None
    }
  }
}

/// Decode `name:value`. The name is letters/digits/underscore up to
/// [`MAX_NAME`] bytes; the value is a finite decimal float. Anything else is
/// None — `nan`/`inf` parse as f32 but have no place in a clamped store.
pub fn parse_command(line: &str) -> Option<(&str, f32)> {
  let (name, value) = line.split_once(':')?;
  if name.is_empty() || name.len() > MAX_NAME {
    return None;
  }
  if !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
    return None;
  }
  let val: f32 = value.trim().parse().ok().filter(|v: &f32| v.is_finite())?;
  Some((name, val))
}

/// Decode one committed line and write it into the parameter store.
/// Malformed and unknown commands are discarded; the protocol has no
/// feedback path, so the only trace is a debug log line.
pub fn apply_command(line: &str, params: &Params) -> bool {
  match parse_command(line) {
    Some((name, val)) => {
      let known = params.set(name, val);
      if known {
        log::debug!("param {name} = {val}");
      } else {
        log::debug!("unknown param dropped: {name}");
      }
      known
    }
    None => {
      if !line.is_empty() {
        log::debug!("malformed command dropped: {line:?}");
      }
      false
    }
  }
}
