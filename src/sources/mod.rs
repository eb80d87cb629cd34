//! Collaborators the capture pipelines read from or hand results to.

pub mod camera;
pub mod gallery;
pub mod location;
pub mod status;
