use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::Cells;
use crate::Pixels;
use crate::validate;
use crate::validate::ValidationError;

/// The settings payload was not a JSON object carrying positive integer `rows`, `columns` and
/// `interval`.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings are not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Settings payload: {0}")]
    NotAnObject(ValidationError),

    #[error("Settings field `{field}`: {source}")]
    Invalid {
        field: &'static str,
        source: ValidationError,
    },
}

/// Pixel dimensions of the area the board has to fit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: Pixels,
    pub height: Pixels,
}

impl Viewport {
    pub const fn new(width: Pixels, height: Pixels) -> Self {
        Self { width, height }
    }
}

/// Resolved pixel layout of a board.
///
/// A `Geometry` is never edited after [`resolve_geometry`] builds it; a new settings payload
/// produces a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    rows: Cells,
    columns: Cells,

    /// Server tick period, in nanoseconds
    interval: u64,
    seed: Option<u64>,

    cell_width: Pixels,
    cell_height: Pixels,
    board_width: Pixels,
    board_height: Pixels,
}

impl Geometry {
    pub fn rows(&self) -> Cells {
        self.rows
    }

    pub fn columns(&self) -> Cells {
        self.columns
    }

    /// Number of cells on the board
    pub fn len(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// How often the server advertises it produces a new generation.
    pub fn interval_duration(&self) -> Duration {
        Duration::from_nanos(self.interval)
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn cell_width(&self) -> Pixels {
        self.cell_width
    }

    pub fn cell_height(&self) -> Pixels {
        self.cell_height
    }

    pub fn board_width(&self) -> Pixels {
        self.board_width
    }

    pub fn board_height(&self) -> Pixels {
        self.board_height
    }

    /// True when a cell is less than one pixel on either axis. Nothing is visible in that case.
    pub fn is_degenerate(&self) -> bool {
        self.cell_width == 0 || self.cell_height == 0
    }
}

/// Parses a settings payload and fits the board it describes into `viewport`.
pub fn resolve_geometry(payload: &str, viewport: Viewport) -> Result<Geometry, SettingsError> {
    let parsed: Value = serde_json::from_str(payload)?;
    let obj = validate::as_object(&parsed).map_err(SettingsError::NotAnObject)?;

    let field = |field: &'static str| -> Result<u32, SettingsError> {
        validate::not_null(obj.get(field))
            .and_then(validate::as_positive_u32)
            .map_err(|source| SettingsError::Invalid { field, source })
    };

    let rows = field("rows")?;
    let columns = field("columns")?;

    let interval = validate::not_null(obj.get("interval"))
        .and_then(validate::as_positive_integer)
        .map_err(|source| SettingsError::Invalid {
            field: "interval",
            source,
        })?;

    // Only the seeded server mode sends one.
    let seed = match obj.get("seed") {
        None | Some(Value::Null) => None,
        Some(val) => Some(
            validate::as_positive_integer(val).map_err(|source| SettingsError::Invalid {
                field: "seed",
                source,
            })?,
        ),
    };

    let geometry = fit(rows, columns, interval, seed, viewport);

    debug!(?geometry, ?viewport, "Resolved board geometry");

    Ok(geometry)
}

/// Aspect-fit a `rows x columns` grid into `viewport`, flooring cells to whole pixels.
fn fit(
    rows: Cells,
    columns: Cells,
    interval: u64,
    seed: Option<u64>,
    viewport: Viewport,
) -> Geometry {
    let (r, c) = (rows as f64, columns as f64);
    let (vw, vh) = (viewport.width as f64, viewport.height as f64);

    let rows_to_columns = r / c;
    let columns_to_rows = c / r;

    let (cell_width, cell_height) = if vw * rows_to_columns < vh {
        // Width is the binding constraint
        let height = vw * rows_to_columns;
        (vw / c, height / r)
    } else {
        let width = vh * columns_to_rows;
        (width / c, vh / r)
    };

    debug!(
        rows_to_columns,
        columns_to_rows,
        width_bound = vw * rows_to_columns < vh,
        "Fitting board"
    );

    let cell_width = cell_width.floor() as Pixels;
    let cell_height = cell_height.floor() as Pixels;

    Geometry {
        rows,
        columns,
        interval,
        seed,
        cell_width,
        cell_height,
        board_width: cell_width * columns,
        board_height: cell_height * rows,
    }
}
