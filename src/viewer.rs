use thiserror::Error;
use tracing::debug;

use crate::draw::Surface;
use crate::frame;
use crate::frame::FrameError;
use crate::params::ViewerParams;
use crate::scheduler::ContractViolation;
use crate::scheduler::PaintHandle;
use crate::scheduler::RenderScheduler;
use crate::settings;
use crate::settings::Geometry;
use crate::settings::SettingsError;
use crate::settings::Viewport;
use crate::stream::StreamError;
use crate::stream::StreamEvent;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Malformed settings: {0}")]
    MalformedSettings(#[from] SettingsError),

    #[error("Malformed frame: {0}")]
    MalformedFrame(#[from] FrameError),

    #[error("Contract violation: {0}")]
    ContractViolation(#[from] ContractViolation),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// Everything one live board view owns: the surface, the current geometry and the paint
/// scheduler.
///
/// A viewer starts disconnected. Between [`Viewer::connect`] and [`Viewer::disconnect`] it expects
/// a settings event followed by any number of frames, possibly with new settings in between.
/// Changing the connection parameters rebuilds the whole pipeline instead of patching it.
pub struct Viewer<S> {
    surface: S,
    viewport: Viewport,
    params: ViewerParams,

    /// `None` until the first settings event of the current connection
    geometry: Option<Geometry>,

    scheduler: RenderScheduler,
}

impl<S: Surface> Viewer<S> {
    pub fn new(surface: S, viewport: Viewport, params: ViewerParams) -> Self {
        let mut scheduler = RenderScheduler::new();
        scheduler.detach();

        Self {
            surface,
            viewport,
            params,
            geometry: None,
            scheduler,
        }
    }

    /// Start a fresh connection. Returns the parameters the stream should be opened with.
    ///
    /// A paint still waiting from an earlier connection is dropped.
    pub fn connect(&mut self) -> &ViewerParams {
        self.scheduler.cancel_paint();
        self.geometry = None;
        self.scheduler.attach();

        debug!(params = ?self.params, "Viewer connected");

        &self.params
    }

    /// Cancel any waiting paint and forget the geometry. No paints are scheduled until the next
    /// [`Viewer::connect`].
    pub fn disconnect(&mut self) {
        self.scheduler.detach();
        self.geometry = None;

        debug!("Viewer disconnected");
    }

    /// Tear down and reconnect with new parameters.
    pub fn reconfigure(&mut self, params: ViewerParams) -> &ViewerParams {
        self.disconnect();
        self.params = params;
        self.connect()
    }

    pub fn is_connected(&self) -> bool {
        self.scheduler.is_attached()
    }

    /// Viewport used for the next settings event. The current geometry is not refitted.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn handle_event(&mut self, event: &StreamEvent) -> Result<(), ViewerError> {
        match event {
            StreamEvent::Settings(payload) => self.handle_settings(payload).map(|_| ()),
            StreamEvent::Frame(payload) => self.handle_frame(payload).map(|_| ()),
        }
    }

    /// Resolve a settings payload and size the surface to the new board.
    ///
    /// On failure the previous geometry stays in place.
    pub fn handle_settings(&mut self, payload: &str) -> Result<&Geometry, ViewerError> {
        if !self.is_connected() {
            return Err(ContractViolation::Detached.into());
        }

        let geometry = settings::resolve_geometry(payload, self.viewport)?;

        // A waiting paint was laid out for the old board
        self.scheduler.cancel_paint();
        self.surface.resize(geometry.board_width(), geometry.board_height());

        Ok(self.geometry.insert(geometry))
    }

    /// Decode a frame against the current geometry and schedule it for the next refresh.
    ///
    /// Any paint still waiting is canceled first, even if this frame turns out to be malformed.
    pub fn handle_frame(&mut self, payload: &str) -> Result<PaintHandle, ViewerError> {
        if !self.is_connected() {
            return Err(ContractViolation::Detached.into());
        }

        self.scheduler.cancel_paint();

        let geometry = self.geometry.ok_or(ContractViolation::FrameBeforeSettings)?;
        let frame = frame::decode_frame(payload, &geometry)?;

        Ok(self.scheduler.schedule_paint(frame, geometry)?)
    }

    /// Called on every display refresh. Returns the paint that ran, if any.
    pub fn on_refresh(&mut self) -> Option<PaintHandle> {
        self.scheduler.on_refresh(&mut self.surface)
    }

    pub fn pending(&self) -> Option<PaintHandle> {
        self.scheduler.pending()
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn params(&self) -> &ViewerParams {
        &self.params
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
