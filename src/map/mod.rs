//! Map thumbnails: tile composition, placeholder art, the pin glyph and the recording cache.

pub mod cache;
pub mod pin;
pub mod placeholder;
pub mod thumbnail;
