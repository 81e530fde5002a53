pub mod engine {
  pub mod audio;
  pub mod control;
  pub mod dsp;
  pub mod params;
  pub mod rig;
}

pub use engine::control::CommandAccumulator;
pub use engine::params::Params;
pub use engine::rig::Rig;
