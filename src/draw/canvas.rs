use crate::Pixels;
use crate::draw::Surface;

/// Hex values of braille dots
///
/// ```text
///  1   8
///  2  10
///  4  20
/// 40  80
/// ```
///
/// Where the base blank pattern is codepoint `0x2800` (or U+2800). Other patterns are the sum of
/// the dots that are on.
const BRAILLE_EMPTY: u32 = 0x2800;

/// `DOTS[y % 4][x % 2]`
const DOTS: [[u32; 2]; 4] = [[0x1, 0x8], [0x2, 0x10], [0x4, 0x20], [0x40, 0x80]];

/// An in-memory 1-bit surface which renders as braille text, 2x4 pixels per character.
pub struct Canvas {
    /// The pixel buffer
    px: Vec<bool>,

    /// The rendered frame
    fb: String,

    /// Width in pixels
    w: usize,

    /// Height in pixels
    h: usize,
}

impl Canvas {
    pub fn new(w: Pixels, h: Pixels) -> Self {
        let (w, h) = (w as usize, h as usize);

        Self {
            px: vec![false; w * h],
            fb: String::new(),
            w,
            h,
        }
    }

    /// Size of a canvas that fills a terminal of `cols x rows` characters.
    pub fn for_terminal(cols: u16, rows: u16) -> Self {
        Self::new(cols as Pixels * 2, rows as Pixels * 4)
    }

    pub fn width(&self) -> Pixels {
        self.w as Pixels
    }

    pub fn height(&self) -> Pixels {
        self.h as Pixels
    }

    pub fn is_set(&self, x: Pixels, y: Pixels) -> bool {
        let (x, y) = (x as usize, y as usize);

        x < self.w && y < self.h && self.px[y * self.w + x]
    }

    /// Number of pixels that are on
    pub fn count_set(&self) -> usize {
        self.px.iter().filter(|&&p| p).count()
    }

    /// Turn every pixel off
    pub fn reset(&mut self) {
        self.px.fill(false);
    }

    /// Render the pixel buffer as lines of braille characters, each terminated by a newline.
    pub fn render(&mut self) -> &str {
        let (bw, bh) = (self.w.div_ceil(2), self.h.div_ceil(4));

        // Each braille character is 3 bytes of UTF-8, plus one newline per line
        self.fb.clear();
        self.fb.reserve(3 * bw * bh + bh);

        for by in 0..bh {
            for bx in 0..bw {
                let mut cp = BRAILLE_EMPTY;

                for (dy, row) in DOTS.iter().enumerate() {
                    for (dx, dot) in row.iter().enumerate() {
                        let (x, y) = (2 * bx + dx, 4 * by + dy);

                        if x < self.w && y < self.h && self.px[y * self.w + x] {
                            cp += dot;
                        }
                    }
                }

                // Every value in 0x2800..=0x28FF is a braille pattern
                if let Some(c) = char::from_u32(cp) {
                    self.fb.push(c);
                }
            }

            self.fb.push('\n');
        }

        &self.fb
    }

    fn set_rect(&mut self, x: Pixels, y: Pixels, width: Pixels, height: Pixels, on: bool) {
        let x0 = (x as usize).min(self.w);
        let y0 = (y as usize).min(self.h);
        let x1 = (x as usize + width as usize).min(self.w);
        let y1 = (y as usize + height as usize).min(self.h);

        for y in y0..y1 {
            self.px[y * self.w + x0..y * self.w + x1].fill(on);
        }
    }
}

impl Surface for Canvas {
    fn resize(&mut self, width: Pixels, height: Pixels) {
        self.w = width as usize;
        self.h = height as usize;

        self.px.clear();
        self.px.resize(self.w * self.h, false);
    }

    fn fill_rect(&mut self, x: Pixels, y: Pixels, width: Pixels, height: Pixels) {
        self.set_rect(x, y, width, height, true);
    }

    fn clear_rect(&mut self, x: Pixels, y: Pixels, width: Pixels, height: Pixels) {
        self.set_rect(x, y, width, height, false);
    }
}

#[cfg(test)]
mod tests {
    use super::Canvas;
    use crate::draw::Surface;

    #[test]
    fn fill_and_clear() {
        let mut canvas = Canvas::new(6, 4);

        canvas.fill_rect(1, 1, 3, 2);
        assert_eq!(canvas.count_set(), 6);
        assert!(canvas.is_set(1, 1));
        assert!(canvas.is_set(3, 2));
        assert!(!canvas.is_set(4, 2));

        canvas.clear_rect(2, 1, 1, 2);
        assert_eq!(canvas.count_set(), 4);
        assert!(!canvas.is_set(2, 1));
    }

    #[test]
    fn rects_are_clipped() {
        let mut canvas = Canvas::new(4, 4);

        canvas.fill_rect(2, 2, 10, 10);
        assert_eq!(canvas.count_set(), 4);

        canvas.fill_rect(9, 9, 1, 1);
        assert_eq!(canvas.count_set(), 4);
    }

    #[test]
    fn empty_rect_draws_nothing() {
        let mut canvas = Canvas::new(4, 4);

        canvas.fill_rect(1, 1, 0, 3);
        canvas.fill_rect(1, 1, 3, 0);

        assert_eq!(canvas.count_set(), 0);
    }

    #[test]
    fn resize_discards_contents() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill_rect(0, 0, 4, 4);

        canvas.resize(8, 2);

        assert_eq!((canvas.width(), canvas.height()), (8, 2));
        assert_eq!(canvas.count_set(), 0);
    }

    #[test]
    fn braille() {
        let mut canvas = Canvas::new(5, 6);

        // left column of the first character, full second character
        canvas.fill_rect(0, 0, 1, 4);
        canvas.fill_rect(2, 0, 2, 4);
        // top-left dot of the bottom right character
        canvas.fill_rect(4, 4, 1, 1);

        let s = canvas.render();
        assert!(s.ends_with('\n'));

        insta::assert_snapshot!(s.trim_end(), @r"
        ⡇⣿⠀
        ⠀⠀⠁
        ");
    }
}
