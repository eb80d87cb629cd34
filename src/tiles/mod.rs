//! Remote map tiles: grid selection, mirror distribution and timed batch fetching.

pub mod fetcher;
pub mod grid;
pub mod source;
