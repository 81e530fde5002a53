pub mod chorus;
pub mod delay;
pub mod overdrive;
pub mod svf;

pub use chorus::Chorus;
pub use delay::DelayLine;
pub use overdrive::Overdrive;
pub use svf::Svf;
