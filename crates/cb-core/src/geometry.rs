//! Canvas geometry: host logical (CSS) size and the derived device-pixel size.

use serde::{Deserialize, Serialize};

/// Size of the canvas as observed from the host, in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasGeometry {
    pub css_width: f64,
    pub css_height: f64,
    pub device_pixel_ratio: f64,
}

impl CanvasGeometry {
    pub fn new(css_width: f64, css_height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            css_width,
            css_height,
            device_pixel_ratio,
        }
    }

    /// Same logical size, freshly sampled pixel ratio.
    pub fn with_ratio(self, device_pixel_ratio: f64) -> Self {
        Self {
            device_pixel_ratio,
            ..self
        }
    }

    /// Physical pixel size sent to the renderer: `css × ratio`, rounded.
    ///
    /// A non-finite or non-positive ratio is treated as `1.0`; negative or
    /// non-finite logical sizes collapse to zero.
    pub fn device_size(&self) -> DeviceSize {
        let ratio = if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        };
        DeviceSize {
            width: to_device_px(self.css_width, ratio),
            height: to_device_px(self.css_height, ratio),
        }
    }
}

fn to_device_px(css: f64, ratio: f64) -> u32 {
    let px = (css * ratio).round();
    if !px.is_finite() || px <= 0.0 {
        0
    } else if px >= u32::MAX as f64 {
        u32::MAX
    } else {
        px as u32
    }
}

/// Whole-pixel drawable size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DeviceSize {
    pub width: u32,
    pub height: u32,
}

impl DeviceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` when either side is zero; no surface can be configured.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for DeviceSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
