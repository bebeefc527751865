//! Lens shading correction (mesh rolloff)
//!
//! Interpolates a per-channel gain mesh out of the LSC tuning tree for the live
//! triggers, calibrates it against the unit's measured tables, resamples it onto the
//! output grid and hands it to the tintless and ALSC collaborators.

pub mod calibration;
pub mod chromatix;
pub mod collaborators;
pub mod grid;
pub mod resample;
pub mod search;
pub mod setting;
pub mod synthetic;
pub mod triggers;
pub mod types;

mod blender;
mod interpolator;
mod pipeline;


pub use calibration::{CalibrationReport, MeasuredCalibrationSet, MeasuredState};
pub use chromatix::{BayerChannel, LscChromatix, LscRegionData, MeshGains};
pub use collaborators::{
    AlscAlgorithm, AlscGrid, AlscParams, NoAlsc, NoTintless, StatsGrid, TintlessAlgorithm,
    TintlessConfig, TintlessStats, TintlessTuning,
};
pub use grid::{GridLayout, optimize_grid};
pub use interpolator::LscInterpolator;
pub use pipeline::{LscPipeline, LscStreamState};
pub use resample::{MeshResampler, ResampleContext, ResampleGeometry, ResampledMesh};
pub use setting::{AlscOutput, LscSetting, MeshGeometry, TintlessInput, TintlessOutcome};
pub use triggers::{LscTriggerInput, LscTriggerVector};
pub use types::{LscConfig, LscConfigBuilder, LscRequest};
