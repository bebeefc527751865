//! External algorithm seams of the setting stage
//!
//! Tintless and ALSC are opaque algorithms owned by other components. The setting stage
//! only builds their inputs and consumes their outputs through these traits.

use crate::iq_pipeline::common::error::{IqError, Result};
use crate::iq_pipeline::lsc::chromatix::{BayerChannel, MESH_POINTS_H, MESH_POINTS_V, MeshGains};

/// Number of tintless threshold entries.
pub const TINTLESS_THRESHOLD_COUNT: usize = 16;

/// Per-region colour statistics (Bayer grid stats), row-major.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatsGrid {
    pub columns: usize,
    pub rows: usize,
    pub r: Vec<f32>,
    pub g: Vec<f32>,
    pub b: Vec<f32>,
}

impl StatsGrid {
    pub fn new(columns: usize, rows: usize) -> Self {
        let cells = columns * rows;
        Self {
            columns,
            rows,
            r: vec![0.0; cells],
            g: vec![0.0; cells],
            b: vec![0.0; cells],
        }
    }

    pub fn cells(&self) -> usize {
        self.columns * self.rows
    }

    pub fn validate(&self) -> Result<()> {
        let cells = self.cells();
        if cells == 0 {
            return Err(IqError::InvalidArgument("empty statistics grid".to_string()));
        }
        if self.r.len() != cells || self.g.len() != cells || self.b.len() != cells {
            return Err(IqError::InvalidArgument(format!(
                "statistics grid {}x{} has channel lengths {}/{}/{}",
                self.columns,
                self.rows,
                self.r.len(),
                self.g.len(),
                self.b.len()
            )));
        }
        Ok(())
    }
}

/// Statistics consumed by tintless.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TintlessStats {
    pub grid: StatsGrid,
    /// Per-channel saturation thresholds of the stats block, R, Gr, Gb, B.
    pub channel_thresholds: [u32; 4],
}

impl TintlessStats {
    pub fn channel_threshold(&self, channel: BayerChannel) -> u32 {
        self.channel_thresholds[channel as usize]
    }
}

/// Tintless tuning for the current request.
#[derive(Debug, Clone, PartialEq)]
pub struct TintlessTuning {
    pub center_weight: f32,
    pub corner_weight: f32,
    pub high_accuracy_mode: bool,
    pub trace_percentage: f32,
    pub update_delay: u32,
    /// The first entry doubles as the correction strength.
    pub thresholds: [f32; TINTLESS_THRESHOLD_COUNT],
}

impl Default for TintlessTuning {
    fn default() -> Self {
        Self {
            center_weight: 1.0,
            corner_weight: 1.0,
            high_accuracy_mode: false,
            trace_percentage: 10.0,
            update_delay: 0,
            thresholds: [4.0; TINTLESS_THRESHOLD_COUNT],
        }
    }
}

/// Rolloff geometry handed to tintless, in full-resolution pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RolloffGeometry {
    pub subgrid_width: u32,
    pub subgrid_height: u32,
    pub horizontal_offset: u32,
    pub vertical_offset: u32,
    pub table_width: u32,
    pub table_height: u32,
    pub subgrid_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TintlessParams {
    pub center_weight: f32,
    pub corner_weight: f32,
    pub accuracy: u8,
    pub trace_percentage: f32,
    pub update_delay: u8,
    pub correction_strength: u8,
    pub thresholds: [u8; TINTLESS_THRESHOLD_COUNT],
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TintlessConfig {
    pub rolloff: RolloffGeometry,
    pub params: TintlessParams,
    /// R, Gr, Gb, B.
    pub saturation_limits: [u32; 4],
}

/// Scalar ALSC parameters, already clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlscParams {
    pub adaptive_gain_high: u16,
    pub adaptive_gain_low: u16,
    pub highlight_gain_strength: u16,
    pub lowlight_gain_strength: u16,
    pub threshold_highlight: u16,
    pub threshold_lowlight: u16,
    pub c_r: u16,
    pub c_g: u16,
    pub c_b: u16,
    pub c_max: u16,
}

/// Raw ALSC result on the mesh point grid.
#[derive(Debug, Clone, PartialEq)]
pub struct AlscGrid {
    pub gain: [[f32; MESH_POINTS_H]; MESH_POINTS_V],
    pub mean: [[f32; MESH_POINTS_H]; MESH_POINTS_V],
}

impl Default for AlscGrid {
    fn default() -> Self {
        Self {
            gain: [[0.0; MESH_POINTS_H]; MESH_POINTS_V],
            mean: [[0.0; MESH_POINTS_H]; MESH_POINTS_V],
        }
    }
}

pub trait TintlessAlgorithm {
    fn process(
        &self,
        config: &TintlessConfig,
        stats: &TintlessStats,
        input: &MeshGains,
    ) -> Result<MeshGains>;
}

pub trait AlscAlgorithm {
    fn process(&self, stats: &StatsGrid, params: &AlscParams) -> Result<AlscGrid>;
}

/// Stand-in used when no tintless algorithm is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTintless;

impl TintlessAlgorithm for NoTintless {
    fn process(&self, _: &TintlessConfig, _: &TintlessStats, _: &MeshGains) -> Result<MeshGains> {
        Err(IqError::CollaboratorFailure(
            "tintless algorithm unavailable".to_string(),
        ))
    }
}

/// Stand-in used when no ALSC algorithm is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAlsc;

impl AlscAlgorithm for NoAlsc {
    fn process(&self, _: &StatsGrid, _: &AlscParams) -> Result<AlscGrid> {
        Err(IqError::CollaboratorFailure(
            "ALSC algorithm unavailable".to_string(),
        ))
    }
}
