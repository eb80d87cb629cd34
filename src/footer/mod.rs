//! The stamped information band appended below photos and video frames.

pub mod compositor;
pub mod layout;
pub mod text;
