//! Zoom ladder and view state.

use crate::error::{ViewerError, ViewerResult};
use pdf_annotator_core::Rotation;
use serde::{Deserialize, Serialize};

/// Two zoom factors closer than this are the same ladder step.
const ZOOM_EPSILON: f32 = 1e-4;

/// The fixed, strictly increasing set of allowed zoom factors.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomLadder {
    levels: Vec<f32>,
}

impl ZoomLadder {
    pub fn new(levels: Vec<f32>) -> ViewerResult<Self> {
        if levels.is_empty() {
            return Err(ViewerError::InvalidZoomLevels("no levels given".to_string()));
        }
        if levels.iter().any(|level| !level.is_finite() || *level <= 0.0) {
            return Err(ViewerError::InvalidZoomLevels("levels must be positive".to_string()));
        }
        if levels.windows(2).any(|pair| pair[1] - pair[0] <= ZOOM_EPSILON) {
            return Err(ViewerError::InvalidZoomLevels("levels must be strictly increasing".to_string()));
        }
        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    pub fn index_of(&self, zoom: f32) -> Option<usize> {
        self.levels.iter().position(|level| (level - zoom).abs() < ZOOM_EPSILON)
    }

    pub fn contains(&self, zoom: f32) -> bool {
        self.index_of(zoom).is_some()
    }

    /// Canonical ladder value for `zoom`, or an error if it is not a step.
    pub fn resolve(&self, zoom: f32) -> ViewerResult<f32> {
        self.index_of(zoom).map(|i| self.levels[i]).ok_or(ViewerError::ZoomNotAllowed(zoom))
    }

    /// Next larger level; stays at the top.
    pub fn step_in(&self, zoom: f32) -> f32 {
        self.levels
            .iter()
            .copied()
            .find(|level| *level > zoom + ZOOM_EPSILON)
            .unwrap_or_else(|| self.max())
    }

    /// Next smaller level; stays at the bottom.
    pub fn step_out(&self, zoom: f32) -> f32 {
        self.levels
            .iter()
            .rev()
            .copied()
            .find(|level| *level < zoom - ZOOM_EPSILON)
            .unwrap_or_else(|| self.min())
    }

    /// Largest level not exceeding `raw`, or the smallest level if all exceed it.
    pub fn fit(&self, raw: f32) -> f32 {
        self.levels
            .iter()
            .rev()
            .copied()
            .find(|level| *level <= raw + ZOOM_EPSILON)
            .unwrap_or_else(|| self.min())
    }

    pub fn min(&self) -> f32 {
        self.levels[0]
    }

    pub fn max(&self) -> f32 {
        self.levels[self.levels.len() - 1]
    }
}

/// What the toolbar shows: current page, zoom factor and rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub current_page: u32,
    pub zoom: f32,
    pub rotation: Rotation,
}

impl ViewState {
    pub fn new(zoom: f32) -> Self {
        Self { current_page: 1, zoom, rotation: Rotation::Deg0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> ZoomLadder {
        ZoomLadder::new(vec![0.5, 1.0, 1.5, 2.0]).unwrap()
    }

    #[test]
    fn ladder_rejects_bad_levels() {
        assert!(ZoomLadder::new(vec![]).is_err());
        assert!(ZoomLadder::new(vec![1.0, 1.0]).is_err());
        assert!(ZoomLadder::new(vec![2.0, 1.0]).is_err());
        assert!(ZoomLadder::new(vec![0.0, 1.0]).is_err());
    }

    #[test]
    fn stepping_clamps_at_the_ends() {
        let ladder = ladder();
        assert_eq!(ladder.step_in(1.0), 1.5);
        assert_eq!(ladder.step_in(2.0), 2.0);
        assert_eq!(ladder.step_out(1.0), 0.5);
        assert_eq!(ladder.step_out(0.5), 0.5);
    }

    #[test]
    fn resolve_accepts_only_ladder_values() {
        let ladder = ladder();
        assert_eq!(ladder.resolve(1.50001).unwrap(), 1.5);
        assert!(matches!(ladder.resolve(1.2), Err(ViewerError::ZoomNotAllowed(_))));
    }

    #[test]
    fn fit_picks_largest_level_that_fits() {
        let ladder = ladder();
        assert_eq!(ladder.fit(1.7), 1.5);
        assert_eq!(ladder.fit(9.0), 2.0);
        assert_eq!(ladder.fit(0.1), 0.5);
    }
}
