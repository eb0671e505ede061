//! Audio subsystem: the GSM 06.10 codec wrapper and the OSS-style
//! playback/capture device abstraction used by the voice pipeline.

pub mod device;
pub mod gsm;

pub use device::{AudioDevice, CaptureDevice, Direction, PlaybackDevice};
pub use gsm::{GsmCodec, ENCODED_FRAME_BYTES, FRAME_SAMPLES};
