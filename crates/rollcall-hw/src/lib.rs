//! rollcall-hw: hardware abstraction for camera capture.
//!
//! V4L2-based camera access with grayscale frame conversion.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, CameraStream, DeviceInfo, PixelFormat};
pub use frame::Frame;
