//! Image quality tuning pipeline module
//!
//! This module provides the trigger-driven tuning interpolation engine, its lens shading
//! correction instance, and a TIFF dump of the resulting gain mesh.

pub mod common;
pub mod interpolation;
pub mod lsc;
pub mod tiff;

pub use common::{
    IqError,
    Result,
};

pub use interpolation::{
    InterpolationOutcome,
    InterpolationTree,
    LeafBlender,
    LevelSearch,
    LinearBlender,
    TriggerRegion,
};

pub use lsc::{
    LscChromatix,
    LscConfig,
    LscConfigBuilder,
    LscPipeline,
    LscRequest,
    LscSetting,
    MeasuredCalibrationSet,
    ResampleGeometry,
};

pub use tiff::{
    DumpConfig,
    DumpConfigBuilder,
    MeshWriter,
    StandardMeshWriter,
    TiffCompression,
};
