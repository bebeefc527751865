//! LSC 4.0 tuning tree types

use crate::iq_pipeline::interpolation::TriggerRegion;

/// Mesh cells per row.
pub const MESH_GRID_H: usize = 16;
/// Mesh cells per column.
pub const MESH_GRID_V: usize = 12;
pub const MESH_POINTS_H: usize = MESH_GRID_H + 1;
pub const MESH_POINTS_V: usize = MESH_GRID_V + 1;
/// Mesh points per channel.
pub const MESH_SIZE: usize = MESH_POINTS_H * MESH_POINTS_V;

/// Bayer channel order of a gain mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BayerChannel {
    R,
    Gr,
    Gb,
    B,
}

impl BayerChannel {
    pub const ALL: [BayerChannel; 4] = [Self::R, Self::Gr, Self::Gb, Self::B];
}

/// Per-channel gain tables, row-major with [`MESH_POINTS_H`] points per row.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGains {
    pub r: [f32; MESH_SIZE],
    pub gr: [f32; MESH_SIZE],
    pub gb: [f32; MESH_SIZE],
    pub b: [f32; MESH_SIZE],
}

impl Default for MeshGains {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl MeshGains {
    pub fn uniform(gain: f32) -> Self {
        Self {
            r: [gain; MESH_SIZE],
            gr: [gain; MESH_SIZE],
            gb: [gain; MESH_SIZE],
            b: [gain; MESH_SIZE],
        }
    }

    pub fn channel(&self, channel: BayerChannel) -> &[f32; MESH_SIZE] {
        match channel {
            BayerChannel::R => &self.r,
            BayerChannel::Gr => &self.gr,
            BayerChannel::Gb => &self.gb,
            BayerChannel::B => &self.b,
        }
    }

    pub fn channel_mut(&mut self, channel: BayerChannel) -> &mut [f32; MESH_SIZE] {
        match channel {
            BayerChannel::R => &mut self.r,
            BayerChannel::Gr => &mut self.gr,
            BayerChannel::Gb => &mut self.gb,
            BayerChannel::B => &mut self.b,
        }
    }

    pub fn channels(&self) -> [&[f32; MESH_SIZE]; 4] {
        [&self.r, &self.gr, &self.gb, &self.b]
    }

    pub fn channels_mut(&mut self) -> [&mut [f32; MESH_SIZE]; 4] {
        [&mut self.r, &mut self.gr, &mut self.gb, &mut self.b]
    }
}

/// Leaf parameter block of the LSC tuning tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LscRegionData {
    pub gains: MeshGains,
    pub adaptive_gain_high: i32,
    pub adaptive_gain_low: i32,
    pub highlight_gain_strength: i32,
    pub lowlight_gain_strength: i32,
    pub threshold_highlight: i32,
    pub threshold_lowlight: i32,
}

impl LscRegionData {
    /// Copies the scalar fields of `other`, leaving the gains untouched.
    pub fn copy_scalars_from(&mut self, other: &LscRegionData) {
        self.adaptive_gain_high = other.adaptive_gain_high;
        self.adaptive_gain_low = other.adaptive_gain_low;
        self.highlight_gain_strength = other.highlight_gain_strength;
        self.lowlight_gain_strength = other.lowlight_gain_strength;
        self.threshold_highlight = other.threshold_highlight;
        self.threshold_lowlight = other.threshold_lowlight;
    }
}

/// Trigger used by the HDR AEC level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AecHdrControl {
    #[default]
    ExpTimeRatio,
    SensitivityRatio,
    ExpGainRatio,
}

/// Trigger used by the AEC level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AecControl {
    #[default]
    LuxIndex,
    Gain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlMethod {
    pub aec_hdr_control: AecHdrControl,
    pub aec_exp_control: AecControl,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PrivateInfo {
    /// Global LED sensitivity region shared by every LED level.
    pub led_sensitivity_trigger: TriggerRegion,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HdrAecTrigger {
    pub exp_time_trigger: TriggerRegion,
    pub aec_sensitivity_trigger: TriggerRegion,
    pub exp_gain_trigger: TriggerRegion,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AecTrigger {
    pub lux_index_trigger: TriggerRegion,
    pub gain_trigger: TriggerRegion,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CctEntry {
    pub cct_trigger: TriggerRegion,
    pub region_data: LscRegionData,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AecEntry {
    pub aec_trigger: AecTrigger,
    pub cct_data: Vec<CctEntry>,
}

/// One LED calibration slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LedEntry {
    pub aec_data: Vec<AecEntry>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HdrAecEntry {
    pub hdr_aec_trigger: HdrAecTrigger,
    pub led_idx_data: Vec<LedEntry>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrcGainEntry {
    pub drc_gain_trigger: TriggerRegion,
    pub hdr_aec_data: Vec<HdrAecEntry>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LensPositionEntry {
    pub lens_position_trigger: TriggerRegion,
    pub drc_gain_data: Vec<DrcGainEntry>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LscCore {
    pub lens_position_data: Vec<LensPositionEntry>,
}

/// Factory reference gains for one colour temperature.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoldenCctEntry {
    pub cct_trigger: TriggerRegion,
    pub gains: MeshGains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnableSection {
    pub rolloff_enable: bool,
    pub alsc_enable: bool,
}

impl Default for EnableSection {
    fn default() -> Self {
        Self {
            rolloff_enable: true,
            alsc_enable: false,
        }
    }
}

/// Loaded LSC tuning tree. Read-only while interpolating.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LscChromatix {
    pub control_method: ControlMethod,
    pub private_info: PrivateInfo,
    pub core: LscCore,
    /// Golden table ordered by colour temperature.
    pub golden: Vec<GoldenCctEntry>,
    pub enable: EnableSection,
}
