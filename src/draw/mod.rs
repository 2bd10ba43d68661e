use crate::Pixels;

pub mod canvas;

pub use self::canvas::Canvas;

/// A 2D raster the board is painted onto.
///
/// Rectangles are given in surface pixels with the origin at the top left. Implementations clip
/// anything that falls outside of their current size.
pub trait Surface {
    /// Sets the drawing area to `width x height` pixels. The contents are discarded.
    fn resize(&mut self, width: Pixels, height: Pixels);

    /// Turns every pixel of the rectangle on
    fn fill_rect(&mut self, x: Pixels, y: Pixels, width: Pixels, height: Pixels);

    /// Turns every pixel of the rectangle off
    fn clear_rect(&mut self, x: Pixels, y: Pixels, width: Pixels, height: Pixels);
}
