//! Editor configuration.

use serde::{Deserialize, Serialize};

use crate::drag::DEFAULT_GUIDE_TOLERANCE;
use crate::layout::Surface;

/// Smallest user export scale.
pub const MIN_EXPORT_SCALE: u8 = 1;

/// Largest user export scale.
pub const MAX_EXPORT_SCALE: u8 = 6;

/// Settings shared by the editing session and the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Working surface size.
    pub surface: Surface,
    /// Distance at which center guides switch on.
    pub guide_tolerance: f32,
    /// User export scale, clamped to 1..=6.
    pub export_scale: u8,
    /// Device pixel ratio multiplied into the export scale.
    pub device_scale: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            surface: Surface::default(),
            guide_tolerance: DEFAULT_GUIDE_TOLERANCE,
            export_scale: 2,
            device_scale: 1.0,
        }
    }
}

impl EditorConfig {
    /// Set the surface size.
    #[must_use]
    pub fn with_surface(mut self, width: f32, height: f32) -> Self {
        self.surface = Surface::new(width, height);
        self
    }

    /// Set the user export scale (clamped).
    #[must_use]
    pub fn with_export_scale(mut self, scale: u8) -> Self {
        self.export_scale = clamp_export_scale(scale);
        self
    }

    /// Set the device pixel ratio. Non-positive values fall back to 1.
    #[must_use]
    pub fn with_device_scale(mut self, scale: f32) -> Self {
        self.device_scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        self
    }

    /// Total raster scale: device ratio times the clamped user scale.
    #[must_use]
    pub fn raster_scale(&self) -> f32 {
        self.device_scale * f32::from(clamp_export_scale(self.export_scale))
    }
}

/// Clamp a user export scale into `1..=6`.
#[must_use]
pub fn clamp_export_scale(scale: u8) -> u8 {
    scale.clamp(MIN_EXPORT_SCALE, MAX_EXPORT_SCALE)
}
