use portolan_types::cartesian::{Point2d, Rect, Size};

/// Current position of the map viewport.
///
/// The view does not render anything itself; it is the piece of state the host engine
/// reads to know what to draw. A freshly created map has no center until one of the
/// positioning operations establishes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    center: Option<Point2d>,
    resolution: f64,
    size: Size,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: None,
            resolution: 1.0,
            size: Size::default(),
        }
    }
}

impl MapView {
    /// Creates a view centered at the given point.
    pub fn new(center: Point2d, resolution: f64) -> Self {
        Self {
            center: Some(center),
            resolution,
            ..Default::default()
        }
    }

    /// Center of the view, if established.
    pub fn center(&self) -> Option<Point2d> {
        self.center
    }

    /// Resolution of the view in map units per pixel.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Size of the viewport in pixels.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Copy of the view centered at the given point.
    pub fn with_center(&self, center: Point2d) -> Self {
        Self {
            center: Some(center),
            ..*self
        }
    }

    /// Copy of the view with the given resolution.
    pub fn with_resolution(&self, resolution: f64) -> Self {
        Self {
            resolution,
            ..*self
        }
    }

    /// Copy of the view with the given viewport size.
    pub fn with_size(&self, size: Size) -> Self {
        Self { size, ..*self }
    }

    /// Extent of the map area currently shown by the viewport. `None` until both the
    /// center and the viewport size are known.
    pub fn bbox(&self) -> Option<Rect> {
        let center = self.center?;
        if self.size.is_zero() {
            return None;
        }

        let half_width = self.size.half_width() * self.resolution;
        let half_height = self.size.half_height() * self.resolution;
        Some(Rect::new(
            center.x - half_width,
            center.y - half_height,
            center.x + half_width,
            center.y + half_height,
        ))
    }
}
