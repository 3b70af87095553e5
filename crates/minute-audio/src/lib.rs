pub mod bang;
pub mod config;
pub mod decode;
pub mod device;
pub mod error;
pub mod playback;
pub mod queue;
pub mod resample;
pub mod session;

pub use bang::BangBuffer;
pub use error::{AudioError, ErrorSink};
pub use session::{AudioSession, SessionOptions};
