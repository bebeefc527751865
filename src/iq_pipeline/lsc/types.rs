//! LSC pipeline configuration and request types

use crate::iq_pipeline::lsc::collaborators::StatsGrid;
use crate::iq_pipeline::lsc::resample::{MESH_VALUE_MAX, MESH_VALUE_MIN, ResampleGeometry};
use crate::iq_pipeline::lsc::setting::TintlessInput;
use crate::iq_pipeline::lsc::triggers::LscTriggerInput;

/// Configuration of one LSC stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LscConfig {
    /// Calibrate against the golden table when a measured set is attached
    pub enable_calibration: bool,
    pub enable_tintless: bool,
    /// Run ALSC when the tuning tree also enables it
    pub enable_alsc: bool,
    /// Lower clamp of resampled gains
    pub mesh_min: f32,
    /// Upper clamp of resampled gains
    pub mesh_max: f32,
}

impl Default for LscConfig {
    fn default() -> Self {
        Self {
            enable_calibration: true,
            enable_tintless: false,
            enable_alsc: false,
            mesh_min: MESH_VALUE_MIN,
            mesh_max: MESH_VALUE_MAX,
        }
    }
}

impl LscConfig {
    pub fn builder() -> LscConfigBuilder {
        LscConfigBuilder::default()
    }
}

/// Builder for LscConfig
#[derive(Default)]
pub struct LscConfigBuilder {
    enable_calibration: Option<bool>,
    enable_tintless: Option<bool>,
    enable_alsc: Option<bool>,
    mesh_min: Option<f32>,
    mesh_max: Option<f32>,
}

impl LscConfigBuilder {
    pub fn enable_calibration(mut self, enable: bool) -> Self {
        self.enable_calibration = Some(enable);
        self
    }

    pub fn enable_tintless(mut self, enable: bool) -> Self {
        self.enable_tintless = Some(enable);
        self
    }

    pub fn enable_alsc(mut self, enable: bool) -> Self {
        self.enable_alsc = Some(enable);
        self
    }

    pub fn mesh_range(mut self, min: f32, max: f32) -> Self {
        self.mesh_min = Some(min);
        self.mesh_max = Some(max);
        self
    }

    pub fn build(self) -> LscConfig {
        let default = LscConfig::default();
        LscConfig {
            enable_calibration: self.enable_calibration.unwrap_or(default.enable_calibration),
            enable_tintless: self.enable_tintless.unwrap_or(default.enable_tintless),
            enable_alsc: self.enable_alsc.unwrap_or(default.enable_alsc),
            mesh_min: self.mesh_min.unwrap_or(default.mesh_min),
            mesh_max: self.mesh_max.unwrap_or(default.mesh_max),
        }
    }
}

/// Everything one frame needs besides the tuning tree.
#[derive(Debug, Clone, PartialEq)]
pub struct LscRequest {
    pub triggers: LscTriggerInput,
    pub geometry: ResampleGeometry,
    pub tintless: Option<TintlessInput>,
    /// AWB grid statistics for ALSC.
    pub alsc_stats: Option<StatsGrid>,
}

impl LscRequest {
    pub fn new(triggers: LscTriggerInput, geometry: ResampleGeometry) -> Self {
        Self {
            triggers,
            geometry,
            tintless: None,
            alsc_stats: None,
        }
    }
}
