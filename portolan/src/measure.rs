//! Distance and area measurement tools.
//!
//! The host engine owns the drawing interaction; the controls here receive the sketch
//! geometry, compute the measured value and manage the transient result window.

use portolan_types::cartesian::{polyline_length, ring_area, Point2d};

use crate::layer::{Color, Style, StyleMap};

/// Kind of measurement a tool performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureKind {
    /// Length of a drawn path.
    Length,
    /// Area of a drawn polygon.
    Area,
}

impl MeasureKind {
    /// Dimensional order of the measured value: 1 for lengths, 2 for areas.
    pub fn order(&self) -> u8 {
        match self {
            MeasureKind::Length => 1,
            MeasureKind::Area => 2,
        }
    }
}

/// A finished measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Measured value.
    pub value: f64,
    /// Units of the value, squared for areas.
    pub units: String,
    /// Dimensional order of the value: 1 for lengths, 2 for areas.
    pub order: u8,
}

/// The transient window showing a measurement result.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurePopup {
    /// Window title.
    pub title: String,
    /// HTML content: the formatted measurement.
    pub html: String,
    /// Window width in pixels.
    pub width: u32,
}

/// Options shared by the measure controls.
#[derive(Debug, Clone)]
pub struct MeasureOptions {
    /// Whether the sketch stays on the map after the measurement is finished.
    pub persist: bool,
    /// Style of the measurement sketch.
    pub sketch_style: StyleMap,
    /// Units the measured values are reported in.
    pub units: String,
}

impl Default for MeasureOptions {
    fn default() -> Self {
        Self {
            persist: true,
            sketch_style: sketch_style(),
            units: "m".into(),
        }
    }
}

/// Factory of the measure controls. Both controls share one options set.
#[derive(Debug, Clone, Default)]
pub struct Measure {
    options: MeasureOptions,
}

impl Measure {
    /// Creates a factory with the given options.
    pub fn new(options: MeasureOptions) -> Self {
        Self { options }
    }

    /// Control measuring the length of a drawn path.
    pub fn create_length_control(&self) -> MeasureControl {
        MeasureControl::new(MeasureKind::Length, self.options.clone())
    }

    /// Control measuring the area of a drawn polygon.
    pub fn create_area_control(&self) -> MeasureControl {
        MeasureControl::new(MeasureKind::Area, self.options.clone())
    }
}

/// A measure control. The host engine feeds it the sketch geometry as the user draws;
/// the control computes the value and keeps exactly one result window at a time.
pub struct MeasureControl {
    kind: MeasureKind,
    options: MeasureOptions,
    popup: Option<MeasurePopup>,
}

impl MeasureControl {
    fn new(kind: MeasureKind, options: MeasureOptions) -> Self {
        Self {
            kind,
            options,
            popup: None,
        }
    }

    /// Kind of measurement this control performs.
    pub fn kind(&self) -> MeasureKind {
        self.kind
    }

    /// Options of the control.
    pub fn options(&self) -> &MeasureOptions {
        &self.options
    }

    /// Computes the measurement of the sketch without displaying it.
    pub fn measure(&self, sketch: &[Point2d]) -> Measurement {
        let value = match self.kind {
            MeasureKind::Length => polyline_length(sketch),
            MeasureKind::Area => ring_area(sketch),
        };

        Measurement {
            value,
            units: self.options.units.clone(),
            order: self.kind.order(),
        }
    }

    /// Called by the host engine when the user finished drawing the sketch. Replaces
    /// any previous result window with the new one.
    pub fn measure_finished(&mut self, sketch: &[Point2d]) -> &MeasurePopup {
        let measurement = self.measure(sketch);
        self.render_measure(&measurement)
    }

    /// Called while the user is still drawing: the previous result is stale, clear it.
    pub fn measure_partial(&mut self) {
        self.clear_measure();
    }

    /// Called when the tool is deactivated.
    pub fn deactivate(&mut self) {
        self.clear_measure();
    }

    /// The currently shown result window, if any.
    pub fn popup(&self) -> Option<&MeasurePopup> {
        self.popup.as_ref()
    }

    fn render_measure(&mut self, measurement: &Measurement) -> &MeasurePopup {
        let mut out = format!("{:.3} {}", measurement.value, measurement.units);
        if measurement.order != 1 {
            out.push_str("<sup>2</sup>");
        }

        self.clear_measure();
        self.popup.insert(MeasurePopup {
            title: "Measure".into(),
            html: out,
            width: 150,
        })
    }

    fn clear_measure(&mut self) {
        self.popup = None;
    }
}

fn sketch_style() -> StyleMap {
    StyleMap::uniform(Style {
        point_radius: 4.0,
        fill_color: Color::WHITE,
        fill_opacity: 0.3,
        stroke_color: Color::rgb(0xFF, 0xFF, 0x33),
        stroke_opacity: 1.0,
        stroke_width: 2.0,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> Vec<Point2d> {
        vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(3.0, 4.0),
            Point2d::new(3.0, 14.0),
        ]
    }

    fn square() -> Vec<Point2d> {
        vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(10.0, 0.0),
            Point2d::new(10.0, 10.0),
            Point2d::new(0.0, 10.0),
        ]
    }

    #[test]
    fn length_result_formatting() {
        let mut control = Measure::default().create_length_control();
        let popup = control.measure_finished(&path());

        assert_eq!(popup.html, "15.000 m");
        assert_eq!(popup.title, "Measure");
    }

    #[test]
    fn area_result_has_square_marker() {
        let mut control = Measure::default().create_area_control();
        let popup = control.measure_finished(&square());

        assert_eq!(popup.html, "100.000 m<sup>2</sup>");
    }

    #[test]
    fn one_result_window_at_a_time() {
        let mut control = Measure::default().create_length_control();

        control.measure_finished(&path());
        let first = control.popup().cloned().expect("window shown");

        control.measure_finished(&square()[..2]);
        let second = control.popup().cloned().expect("window shown");

        assert_ne!(first, second);
        assert_eq!(second.html, "10.000 m");
    }

    #[test]
    fn partial_measurement_clears_result() {
        let mut control = Measure::default().create_length_control();
        control.measure_finished(&path());
        assert!(control.popup().is_some());

        control.measure_partial();
        assert!(control.popup().is_none());

        control.measure_finished(&path());
        control.deactivate();
        assert!(control.popup().is_none());
    }

    #[test]
    fn orders() {
        let measure = Measure::default();
        assert_eq!(measure.create_length_control().measure(&path()).order, 1);
        assert_eq!(measure.create_area_control().measure(&square()).order, 2);
    }
}
