use thiserror::Error;
use tracing::debug;
use tracing::trace;

use crate::draw::Surface;
use crate::frame::Frame;
use crate::settings::Geometry;

/// The caller used the pipeline out of order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("Frame received before any settings")]
    FrameBeforeSettings,

    #[error("Cannot schedule a paint while detached")]
    Detached,
}

/// Identifies one scheduled paint. Handles are never reused by a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaintHandle(u64);

struct PendingPaint {
    handle: PaintHandle,
    frame: Frame,
    geometry: Geometry,
}

/// Holds at most one paint waiting for the next display refresh.
///
/// Scheduling a paint cancels the one that is waiting, so only the newest frame is ever drawn. A
/// paint runs to completion inside [`RenderScheduler::on_refresh`], which needs exclusive access
/// to the scheduler, so two paints can never interleave their writes.
pub struct RenderScheduler {
    pending: Option<PendingPaint>,
    next_handle: u64,
    attached: bool,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self {
            pending: None,
            next_handle: 0,
            attached: true,
        }
    }

    /// Replace any waiting paint with one drawing `frame` on the next refresh.
    pub fn schedule_paint(
        &mut self,
        frame: Frame,
        geometry: Geometry,
    ) -> Result<PaintHandle, ContractViolation> {
        if !self.attached {
            return Err(ContractViolation::Detached);
        }

        if let Some(stale) = self.cancel_paint() {
            trace!(?stale, "Superseded paint");
        }

        let handle = PaintHandle(self.next_handle);
        self.next_handle += 1;

        self.pending = Some(PendingPaint {
            handle,
            frame,
            geometry,
        });

        Ok(handle)
    }

    /// Cancel the waiting paint, if any, returning its handle.
    pub fn cancel_paint(&mut self) -> Option<PaintHandle> {
        self.pending.take().map(|p| p.handle)
    }

    /// Cancel `handle` if it is still waiting. Returns false if it already ran or was superseded.
    pub fn cancel(&mut self, handle: PaintHandle) -> bool {
        if self.pending() == Some(handle) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn pending(&self) -> Option<PaintHandle> {
        self.pending.as_ref().map(|p| p.handle)
    }

    /// Called once per display refresh. Runs the waiting paint, if there is one.
    pub fn on_refresh<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Option<PaintHandle> {
        let PendingPaint {
            handle,
            frame,
            geometry,
        } = self.pending.take()?;

        trace!(?handle, "Painting frame");
        paint(&frame, &geometry, surface);

        Some(handle)
    }

    /// Cancel the waiting paint and refuse new ones until [`RenderScheduler::attach`].
    pub fn detach(&mut self) {
        if let Some(handle) = self.cancel_paint() {
            debug!(?handle, "Canceled paint on detach");
        }

        self.attached = false;
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

/// Draw every cell of `frame` in row-major order. Live cells are filled, dead cells are cleared.
pub fn paint<S: Surface + ?Sized>(frame: &Frame, geometry: &Geometry, surface: &mut S) {
    let (cw, ch) = (geometry.cell_width(), geometry.cell_height());
    let columns = geometry.columns();

    for row in 0..geometry.rows() {
        for column in 0..columns {
            let (x, y) = (column * cw, row * ch);

            if frame.is_alive(columns, row, column) {
                surface.fill_rect(x, y, cw, ch);
            } else {
                surface.clear_rect(x, y, cw, ch);
            }
        }
    }
}
