//! Stream encoders for recorded footage.

pub mod ffmpeg;
pub mod sink;
