pub mod canvas;
pub mod raster;
pub mod text;
