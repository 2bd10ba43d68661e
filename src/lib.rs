pub mod draw;
pub mod frame;
pub mod params;
pub mod scheduler;
pub mod settings;
pub mod stream;
pub mod validate;
pub mod viewer;

/// Surface pixels
pub type Pixels = u32;

/// Board rows and columns
pub type Cells = u32;
