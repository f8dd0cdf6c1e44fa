//! Interactive spinning-globe widget.
//!
//! Each widget owns its geometry and its own [`DragMomentum`], so the small
//! thumbnail globe and the large modal globe never share scroll state. The
//! widget only reports coordinates and drag/hover flags; tooltips and markers
//! belong to the host.

use log::debug;

use crate::momentum::{CoastToken, DragMomentum, FrameOutcome, MomentumParams};
use crate::projection::{GeoPoint, ViewportGeometry, pixel_to_lat_lon};

type PickCallback = Box<dyn FnMut(GeoPoint) + Send>;

pub struct GlobeWidget {
    geometry: ViewportGeometry,
    momentum: DragMomentum,
    hover: Option<GeoPoint>,
    on_location_picked: Option<PickCallback>,
}

impl std::fmt::Debug for GlobeWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobeWidget")
            .field("geometry", &self.geometry)
            .field("momentum", &self.momentum)
            .field("hover", &self.hover)
            .finish_non_exhaustive()
    }
}

impl GlobeWidget {
    pub fn new(geometry: ViewportGeometry, params: MomentumParams) -> Self {
        Self {
            momentum: DragMomentum::new(geometry.texture_width_px(), params),
            geometry,
            hover: None,
            on_location_picked: None,
        }
    }

    /// Called with the coordinates of every accepted selection click.
    pub fn set_on_location_picked<F>(&mut self, callback: F)
    where
        F: FnMut(GeoPoint) + Send + 'static,
    {
        self.on_location_picked = Some(Box::new(callback));
    }

    pub fn geometry(&self) -> &ViewportGeometry {
        &self.geometry
    }

    pub fn momentum(&self) -> &DragMomentum {
        &self.momentum
    }

    pub fn offset_px(&self) -> f64 {
        self.momentum.offset_px()
    }

    pub fn set_offset(&mut self, offset_px: f64) {
        self.momentum.set_offset(offset_px);
    }

    pub fn is_dragging(&self) -> bool {
        self.momentum.is_dragging()
    }

    pub fn is_coasting(&self) -> bool {
        self.momentum.is_coasting()
    }

    /// The coordinate under the pointer, if it is over the face.
    pub fn hover(&self) -> Option<GeoPoint> {
        self.hover
    }

    pub fn pointer_down(&mut self, x: f64, _y: f64) {
        self.momentum.pointer_down(x);
    }

    /// Rotates while a press is held, otherwise tracks the hover coordinate.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if self.momentum.pointer_move(x) {
            self.hover = None;
        } else if !self.momentum.is_dragging() {
            self.hover = pixel_to_lat_lon(x, y, self.offset_px(), &self.geometry);
        }
    }

    pub fn pointer_leave(&mut self) {
        self.hover = None;
    }

    /// Returns a token for the host's frame loop when the release should coast.
    pub fn pointer_up(&mut self) -> Option<CoastToken> {
        self.momentum.pointer_up()
    }

    pub fn on_frame(&mut self, token: CoastToken) -> FrameOutcome {
        self.momentum.on_frame(token)
    }

    /// Resolve a click. Clicks that end a drag or land off the face are ignored.
    pub fn click(&mut self, x: f64, y: f64) -> Option<GeoPoint> {
        if self.momentum.was_dragging() {
            debug!("click at ({x:.1}, {y:.1}) ends a drag, not a selection");
            return None;
        }

        let point = pixel_to_lat_lon(x, y, self.offset_px(), &self.geometry)?;
        debug!("picked {:.3}, {:.3}", point.lat, point.lon);
        if let Some(callback) = self.on_location_picked.as_mut() {
            callback(point);
        }
        Some(point)
    }
}

/// The thumbnail globe plus the enlarged globe shown in a modal.
#[derive(Debug)]
pub struct GlobePair {
    thumbnail: GlobeWidget,
    modal: GlobeWidget,
    modal_open: bool,
}

impl GlobePair {
    pub fn new(thumbnail: GlobeWidget, modal: GlobeWidget) -> Self {
        Self {
            thumbnail,
            modal,
            modal_open: false,
        }
    }

    pub fn thumbnail(&self) -> &GlobeWidget {
        &self.thumbnail
    }

    pub fn modal(&self) -> &GlobeWidget {
        &self.modal
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    /// Show the modal globe at the rotation the thumbnail currently shows.
    pub fn open_modal(&mut self) {
        self.thumbnail.momentum.cancel_coast();
        let offset = scale_offset(&self.thumbnail, &self.modal);
        self.modal.set_offset(offset);
        self.modal_open = true;
    }

    /// Hide the modal and carry its rotation back to the thumbnail.
    pub fn close_modal(&mut self) {
        self.modal.momentum.cancel_coast();
        let offset = scale_offset(&self.modal, &self.thumbnail);
        self.thumbnail.set_offset(offset);
        self.modal_open = false;
    }

    /// The globe currently receiving pointer input.
    pub fn active_mut(&mut self) -> &mut GlobeWidget {
        if self.modal_open {
            &mut self.modal
        } else {
            &mut self.thumbnail
        }
    }
}

fn scale_offset(from: &GlobeWidget, to: &GlobeWidget) -> f64 {
    from.offset_px() * to.geometry.texture_width_px() / from.geometry.texture_width_px()
}
