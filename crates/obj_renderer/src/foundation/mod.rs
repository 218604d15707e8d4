//! Foundation types shared by the loader and the renderer

pub mod logging;
pub mod math;
