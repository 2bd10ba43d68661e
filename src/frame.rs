use base64::Engine;
use base64::alphabet;
use base64::engine::DecodePaddingMode;
use base64::engine::general_purpose::GeneralPurpose;
use base64::engine::general_purpose::GeneralPurposeConfig;
use thiserror::Error;
use tracing::trace;

use crate::Cells;
use crate::settings::Geometry;

/// A frame payload that cannot be turned into a board snapshot.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Frame is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Frame is empty, expected at least the padding byte")]
    Empty,

    #[error("Frame bitmap is too short: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },
}

/// Standard alphabet that accepts missing or present `=` padding and non-zero trailing bits.
const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// One decoded board generation.
///
/// The layout is a single leading padding byte followed by the bitmap: `rows * columns` bits in
/// row-major order, most significant bit first within each byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    padding: u8,
    bitmap: Vec<u8>,
}

/// Decodes a base64 frame payload for a board laid out as `geometry`.
///
/// ASCII whitespace anywhere in the payload is ignored and `=` padding is optional. The bitmap
/// must hold at least `rows * columns` bits. Extra trailing bytes are kept and never read.
pub fn decode_frame(payload: &str, geometry: &Geometry) -> Result<Frame, FrameError> {
    let payload: Vec<u8> = payload.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    let bytes = FORGIVING.decode(payload)?;

    let [padding, bitmap @ ..] = bytes.as_slice() else {
        return Err(FrameError::Empty);
    };

    let expected = geometry.len().div_ceil(8);
    if bitmap.len() < expected {
        return Err(FrameError::Truncated {
            expected,
            got: bitmap.len(),
        });
    }

    let frame = Frame {
        padding: *padding,
        bitmap: bitmap.to_vec(),
    };

    trace!(
        padding = frame.padding,
        "Decoded frame\n{}",
        frame.dump(geometry.rows(), geometry.columns())
    );

    Ok(frame)
}

/// Whether the cell at `(row, column)` is alive in `frame`.
pub fn is_alive(frame: &Frame, geometry: &Geometry, row: Cells, column: Cells) -> bool {
    frame.is_alive(geometry.columns(), row, column)
}

impl Frame {
    /// The leading byte of the payload. Its meaning is left to the producer; it is carried as-is.
    pub fn padding(&self) -> u8 {
        self.padding
    }

    pub fn bitmap(&self) -> &[u8] {
        &self.bitmap
    }

    /// Looks up a single cell. `row` and `column` must lie inside the board the frame was decoded
    /// for.
    pub fn is_alive(&self, columns: Cells, row: Cells, column: Cells) -> bool {
        debug_assert!(column < columns, "column is out of bounds");

        let bit_pos = row as usize * columns as usize + column as usize;
        let (byte_pos, in_byte_pos) = (bit_pos / 8, bit_pos % 8);

        let mask = 1u8 << (7 - in_byte_pos);

        self.bitmap[byte_pos] & mask != 0
    }

    /// Renders the board as rows of `0`/`1`, split into groups of 8 bits.
    pub fn dump(&self, rows: Cells, columns: Cells) -> String {
        let line = columns as usize + columns as usize / 8 + 1;
        let mut out = String::with_capacity(rows as usize * line);

        for row in 0..rows {
            for column in 0..columns {
                if column > 0 && column % 8 == 0 {
                    out.push(' ');
                }

                out.push(if self.is_alive(columns, row, column) { '1' } else { '0' });
            }

            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    use super::FrameError;
    use super::decode_frame;
    use crate::settings::Geometry;
    use crate::settings::Viewport;
    use crate::settings::resolve_geometry;

    fn geometry(rows: u32, columns: u32) -> Geometry {
        let payload = format!(r#"{{"rows":{rows},"columns":{columns},"interval":1}}"#);
        resolve_geometry(&payload, Viewport::new(100, 100)).unwrap()
    }

    #[test]
    fn three_by_three() {
        let g = geometry(3, 3);
        let payload = STANDARD.encode([0, 0b1010_1000, 0b0000_0000]);
        let frame = decode_frame(&payload, &g).unwrap();

        let alive = [(0, 0), (0, 2), (1, 1)];

        for row in 0..3 {
            for column in 0..3 {
                assert_eq!(
                    super::is_alive(&frame, &g, row, column),
                    alive.contains(&(row, column)),
                    "({row}, {column})"
                );
            }
        }
    }

    #[test]
    fn forgiving_base64() {
        let g = geometry(3, 3);

        for payload in ["AKBA", "AKBAAA", "AKBAAA==", "AKBAAB", "AKB A", " AK\nBA\n"] {
            let frame = decode_frame(payload, &g).unwrap();

            assert_eq!(frame.padding(), 0, "{payload:?}");
            assert_eq!(&frame.bitmap()[..2], &[0xA0, 0x40], "{payload:?}");
        }
    }

    #[test]
    fn keeps_padding_byte() {
        let g = geometry(2, 3);
        let payload = STANDARD.encode([2, 0b1111_1100]);
        let frame = decode_frame(&payload, &g).unwrap();

        assert_eq!(frame.padding(), 2);
        assert_eq!(frame.bitmap(), &[0b1111_1100]);
    }

    #[test]
    fn decoding_is_repeatable() {
        let g = geometry(4, 5);
        let payload = STANDARD.encode([4, 0b1001_0110, 0b0111_0001, 0b1010_0000]);

        let a = decode_frame(&payload, &g).unwrap();
        let b = decode_frame(&payload, &g).unwrap();

        assert_eq!(a, b);
        for row in 0..4 {
            for column in 0..5 {
                assert_eq!(a.is_alive(5, row, column), b.is_alive(5, row, column));
            }
        }
    }

    #[test]
    fn rejects_bad_base64() {
        let g = geometry(3, 3);

        assert!(matches!(
            decode_frame("not base64!", &g),
            Err(FrameError::InvalidBase64(_))
        ));
    }

    #[test]
    fn rejects_empty_frame() {
        let g = geometry(3, 3);

        assert!(matches!(decode_frame("", &g), Err(FrameError::Empty)));
    }

    #[test]
    fn rejects_short_bitmap() {
        let g = geometry(3, 3);
        let payload = STANDARD.encode([0, 0b1010_0000]);

        assert!(matches!(
            decode_frame(&payload, &g),
            Err(FrameError::Truncated {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn dump() {
        let g = geometry(3, 10);
        let payload = STANDARD.encode([2, 0b1000_0000, 0b0100_0000, 0b0010_0000, 0b0001_0000]);
        let frame = decode_frame(&payload, &g).unwrap();

        insta::assert_snapshot!(frame.dump(3, 10).trim_end(), @r"
        10000000 01
        00000000 10
        00000001 00
        ");
    }
}
