pub mod source;
pub mod display;
pub mod control;

pub use control::{KeyPoll, ParameterSource, SharedCalibration, SleepKeys, StdinControl, ESC_KEY};
pub use display::{DirectorySink, DisplaySink, NullSink, Surface};
pub use source::{FrameSource, ImageSequence};
