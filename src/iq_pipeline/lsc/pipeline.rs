use tracing::{debug, instrument};

use crate::iq_pipeline::common::error::Result;
use crate::iq_pipeline::lsc::calibration::MeasuredCalibrationSet;
use crate::iq_pipeline::lsc::chromatix::{LscChromatix, LscRegionData};
use crate::iq_pipeline::lsc::collaborators::{
    AlscAlgorithm, AlscParams, NoAlsc, NoTintless, TintlessAlgorithm,
};
use crate::iq_pipeline::lsc::interpolator::LscInterpolator;
use crate::iq_pipeline::lsc::resample::{MeshResampler, ResampleContext};
use crate::iq_pipeline::lsc::setting::{
    LscSetting, LscSettingCalculator, MeshGeometry, TintlessRatioCache,
};
use crate::iq_pipeline::lsc::types::{LscConfig, LscRequest};

/// State one camera stream carries from frame to frame.
#[derive(Debug, Clone, Default)]
pub struct LscStreamState {
    resample: ResampleContext,
    tintless_ratio: TintlessRatioCache,
    frames: u64,
}

impl LscStreamState {
    pub fn resample(&self) -> &ResampleContext {
        &self.resample
    }

    pub fn tintless_ratio(&self) -> &TintlessRatioCache {
        &self.tintless_ratio
    }

    /// Frames processed successfully.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

fn resampler_for(config: &LscConfig) -> Result<MeshResampler> {
    MeshResampler::new(config.mesh_min, config.mesh_max)
}

/// Per-stream LSC pipeline: interpolate, calibrate, resample, then tintless and ALSC.
///
/// Borrows the loaded tuning tree for its whole lifetime. One pipeline serves one
/// camera stream; streams processed in parallel each need their own.
pub struct LscPipeline<'a, T: TintlessAlgorithm, A: AlscAlgorithm> {
    chromatix: &'a LscChromatix,
    interpolator: LscInterpolator<'a>,
    resampler: MeshResampler,
    tintless: T,
    alsc: A,
    config: LscConfig,
    measured: Option<MeasuredCalibrationSet>,
    state: LscStreamState,
    interpolated: LscRegionData,
}

impl<'a> LscPipeline<'a, NoTintless, NoAlsc> {
    pub fn new(chromatix: &'a LscChromatix, config: LscConfig) -> Result<Self> {
        Self::with_custom(chromatix, NoTintless, NoAlsc, config)
    }
}

impl<'a, T: TintlessAlgorithm, A: AlscAlgorithm> LscPipeline<'a, T, A> {
    pub fn with_custom(
        chromatix: &'a LscChromatix,
        tintless: T,
        alsc: A,
        config: LscConfig,
    ) -> Result<Self> {
        Ok(Self {
            chromatix,
            interpolator: LscInterpolator::new()?,
            resampler: resampler_for(&config)?,
            tintless,
            alsc,
            config,
            measured: None,
            state: LscStreamState::default(),
            interpolated: LscRegionData::default(),
        })
    }

    /// Attaches the measured calibration tables of this unit.
    pub fn with_measured_calibration(mut self, measured: MeasuredCalibrationSet) -> Self {
        self.measured = Some(measured);
        self
    }

    pub fn measured_calibration(&self) -> Option<&MeasuredCalibrationSet> {
        self.measured.as_ref()
    }

    #[instrument(skip(self, request), fields(
        width = request.geometry.output_width,
        height = request.geometry.output_height
    ))]
    pub fn process(&mut self, request: &LscRequest) -> Result<LscSetting> {
        debug!("Starting LSC setting calculation");

        let calibration = {
            let _span = tracing::info_span!("interpolate").entered();
            let measured = if self.config.enable_calibration {
                self.measured.as_mut()
            } else {
                None
            };
            self.interpolator.interpolate(
                self.chromatix,
                &request.triggers,
                measured,
                &mut self.interpolated,
            )?
        };

        let mut mesh = {
            let _span = tracing::info_span!("resample").entered();
            self.resampler.resample(
                &mut self.state.resample,
                &self.interpolated.gains,
                &request.geometry,
            )?
        };
        let geometry = MeshGeometry::from_layout(&mesh.layout);
        let calculator = LscSettingCalculator::new(&self.tintless, &self.alsc);

        let tintless = {
            let _span = tracing::info_span!("tintless").entered();
            calculator.apply_tintless(
                self.config.enable_tintless,
                request.tintless.as_ref(),
                &geometry,
                &mut mesh.gains,
                &mut self.state.tintless_ratio,
            )
        };

        let alsc_params = AlscParams::from_region(&self.interpolated);
        let alsc = {
            let _span = tracing::info_span!("alsc").entered();
            let requested = self.config.enable_alsc && self.chromatix.enable.alsc_enable;
            calculator.compute_alsc(requested, request.alsc_stats.as_ref(), &alsc_params)
        };

        self.state.frames += 1;
        debug!(
            grid_h = geometry.grid_count_h,
            grid_v = geometry.grid_count_v,
            tintless = ?tintless,
            alsc = alsc.is_some(),
            "LSC setting complete"
        );

        Ok(LscSetting {
            rolloff_enable: self.chromatix.enable.rolloff_enable,
            mesh,
            geometry,
            alsc_params,
            tintless,
            alsc_enabled: alsc.is_some(),
            alsc,
            calibration,
        })
    }

    /// Interpolated block of the last request, before resampling.
    pub fn interpolated(&self) -> &LscRegionData {
        &self.interpolated
    }

    pub fn config(&self) -> &LscConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LscConfig) -> Result<()> {
        self.resampler = resampler_for(&config)?;
        self.config = config;
        Ok(())
    }

    pub fn state(&self) -> &LscStreamState {
        &self.state
    }

    /// Drops all per-stream state, as after a stream restart.
    pub fn reset(&mut self) {
        self.state = LscStreamState::default();
    }
}
