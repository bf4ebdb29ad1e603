use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Resolution of zoom level 0 of the standard web tile scheme.
pub const TOP_RESOLUTION: f64 = 156543.03392800014;

const RESOLUTION_TOLERANCE: f64 = 0.01;

/// Level of detail of the map: a zoom level together with its resolution in map units
/// per pixel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Lod {
    resolution: f64,
    z_index: u32,
}

impl Lod {
    /// Creates new level of detail.
    pub fn new(resolution: f64, z_index: u32) -> Option<Lod> {
        if resolution.is_finite() && resolution > 0.0 {
            Some(Self {
                resolution,
                z_index,
            })
        } else {
            None
        }
    }

    /// Zoom level of this LOD.
    pub fn z_index(&self) -> u32 {
        self.z_index
    }

    /// Resolution of the LOD.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }
}

impl PartialEq for Lod {
    fn eq(&self, other: &Self) -> bool {
        self.resolution == other.resolution
    }
}

impl Eq for Lod {}

impl PartialOrd for Lod {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Lod {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.resolution
            .partial_cmp(&other.resolution)
            .unwrap_or_else(|| self.z_index.cmp(&other.z_index))
    }
}

/// Ordered set of zoom levels the map can be set to.
#[derive(Debug, Clone)]
pub struct ZoomScheme {
    lods: BTreeSet<Lod>,
}

impl ZoomScheme {
    /// Creates a scheme from the given levels of detail.
    pub fn new(lods: impl IntoIterator<Item = Lod>) -> Self {
        Self {
            lods: lods.into_iter().collect(),
        }
    }

    /// Standard web mercator scheme with levels `0..=max_z_index`, each level twice as
    /// detailed as the previous one.
    pub fn web(max_z_index: u32) -> Self {
        let mut lods = BTreeSet::new();
        for z in 0..=max_z_index {
            if let Some(lod) = Lod::new(TOP_RESOLUTION / 2.0_f64.powi(z as i32), z) {
                lods.insert(lod);
            }
        }

        Self { lods }
    }

    /// Resolution of the given zoom level, if it is part of the scheme.
    pub fn lod_resolution(&self, z: u32) -> Option<f64> {
        for lod in &self.lods {
            if lod.z_index() == z {
                return Some(lod.resolution());
            }
        }

        None
    }

    /// The LOD used to display the map at the given resolution: the most detailed one
    /// that is not finer than the resolution (up to a small tolerance).
    pub fn select_lod(&self, resolution: f64) -> Option<Lod> {
        if !resolution.is_finite() {
            return None;
        }

        let mut prev_lod = self.lods.iter().next()?;
        for lod in self.lods.iter().skip(1) {
            if lod.resolution() * (1.0 - RESOLUTION_TOLERANCE) > resolution {
                break;
            }

            prev_lod = lod;
        }

        Some(*prev_lod)
    }

    /// The most detailed LOD whose resolution still covers `required` map units per
    /// pixel, used to fit an extent into the view. `None` when even the coarsest level
    /// cannot cover it.
    pub fn fit_lod(&self, required: f64) -> Option<Lod> {
        if !required.is_finite() {
            return None;
        }

        self.lods
            .iter()
            .find(|lod| lod.resolution() * (1.0 + RESOLUTION_TOLERANCE) >= required)
            .copied()
    }

    /// The most detailed LOD of the scheme.
    pub fn deepest(&self) -> Option<Lod> {
        self.lods.iter().next().copied()
    }

    /// The least detailed LOD of the scheme.
    pub fn coarsest(&self) -> Option<Lod> {
        self.lods.iter().next_back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn lod_comparison() {
        assert_eq!(Lod::new(1.0, 1), Lod::new(1.0, 1));
        assert_eq!(Lod::new(1.0, 1), Lod::new(1.0, 2));
        assert!(Lod::new(2.0, 1) > Lod::new(1.0, 1));
        assert!(Lod::new(2.0, 1) < Lod::new(4.0, 1));
    }

    #[test]
    fn invalid_lod_creation() {
        assert!(Lod::new(1.0, 1).is_some());
        assert!(Lod::new(0.0, 1).is_none());
        assert!(Lod::new(f64::NAN, 1).is_none());
        assert!(Lod::new(f64::INFINITY, 1).is_none());
    }

    #[test]
    fn web_scheme_resolutions() {
        let scheme = ZoomScheme::web(18);

        assert_abs_diff_eq!(
            scheme.lod_resolution(0).expect("level exists"),
            TOP_RESOLUTION
        );
        assert_abs_diff_eq!(
            scheme.lod_resolution(4).expect("level exists"),
            TOP_RESOLUTION / 16.0
        );
        assert!(scheme.lod_resolution(19).is_none());
        assert_eq!(scheme.deepest().map(|lod| lod.z_index()), Some(18));
        assert_eq!(scheme.coarsest().map(|lod| lod.z_index()), Some(0));
    }

    #[test]
    fn select_lod_picks_not_finer() {
        let scheme = ZoomScheme::web(18);

        let selected = scheme
            .select_lod(TOP_RESOLUTION / 16.0 * 1.5)
            .expect("in range");
        assert_eq!(selected.z_index(), 4);

        // Slightly off resolutions snap to the level within the tolerance.
        let selected = scheme
            .select_lod(TOP_RESOLUTION / 16.0 * 0.995)
            .expect("in range");
        assert_eq!(selected.z_index(), 4);
    }

    #[test]
    fn fit_lod_covers_required_resolution() {
        let scheme = ZoomScheme::web(18);

        let fitted = scheme.fit_lod(TOP_RESOLUTION / 10.0).expect("in range");
        assert_eq!(fitted.z_index(), 3);

        assert!(scheme.fit_lod(TOP_RESOLUTION * 10.0).is_none());
    }
}
