//! Setting stage: rolloff geometry, tintless and ALSC on top of the resampled mesh

use tracing::{debug, error, warn};

use crate::iq_pipeline::lsc::calibration::{CALIBRATION_ZERO_TOLERANCE, CalibrationReport};
use crate::iq_pipeline::lsc::chromatix::{
    BayerChannel, LscRegionData, MESH_POINTS_H, MESH_POINTS_V, MeshGains,
};
use crate::iq_pipeline::lsc::collaborators::{
    AlscAlgorithm, AlscGrid, AlscParams, RolloffGeometry, StatsGrid, TINTLESS_THRESHOLD_COUNT,
    TintlessAlgorithm, TintlessConfig, TintlessParams, TintlessStats, TintlessTuning,
};
use crate::iq_pipeline::lsc::grid::GridLayout;
use crate::iq_pipeline::lsc::resample::ResampledMesh;

/// Fractional bits of a packed mesh gain.
pub const MESH_Q_FACTOR: u32 = 10;
/// Packed mesh gains are 13 bits wide.
pub const MESH_GAIN_Q_MAX: u16 = (1 << 13) - 1;
/// Fractional bits of the reciprocal subgrid sizes.
pub const DELTA_Q_FACTOR: u32 = 20;

pub const ADAPTIVE_GAIN_MAX: i32 = 4095;
pub const GAIN_STRENGTH_MAX: i32 = 100;
pub const LIGHT_THRESHOLD_MAX: i32 = 1023;
pub const LUMA_COEFF_R: u16 = 306;
pub const LUMA_COEFF_G: u16 = 601;
pub const LUMA_COEFF_B: u16 = 117;

/// Converts a gain to unsigned Q10, saturating at 13 bits.
pub fn gain_to_q10(gain: f32) -> u16 {
    let scaled = (gain * (1 << MESH_Q_FACTOR) as f32).round();
    scaled.clamp(0.0, f32::from(MESH_GAIN_Q_MAX)) as u16
}

/// Rolloff block geometry derived from a grid layout, in Bayer-plane units unless noted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshGeometry {
    pub grid_count_h: u32,
    pub grid_count_v: u32,
    /// `log2` of the subgrids per block.
    pub interpolation_factor: u32,
    pub subgrid_width: u32,
    pub subgrid_height: u32,
    pub block_width: u32,
    pub block_height: u32,
    /// Q20 reciprocal of the subgrid width.
    pub x_delta: u32,
    pub y_delta: u32,
    /// Starting block.
    pub lx_start: u32,
    pub ly_start: u32,
    /// Starting subgrid inside the block.
    pub bx_start: u32,
    pub by_start: u32,
    /// Starting pixel inside the subgrid.
    pub bx_d1: u32,
    pub by_e1: u32,
    pub by_init_e1: u32,
    /// Subgrid size and offsets in full-resolution pixels, as tintless expects them.
    pub tintless_subgrid_width: u32,
    pub tintless_subgrid_height: u32,
    pub tintless_offset_h: u32,
    pub tintless_offset_v: u32,
}

impl MeshGeometry {
    pub fn from_layout(layout: &GridLayout) -> Self {
        let scale = layout.scale.max(1);
        let interpolation_factor = (scale as f32).log2().round() as u32;
        let subgrid_width = layout.subgrid_width.max(1);
        let subgrid_height = layout.subgrid_height.max(1);
        let block_width = subgrid_width * scale;
        let block_height = subgrid_height * scale;

        let x_delta = (1 << DELTA_Q_FACTOR) / subgrid_width;
        let y_delta = (1 << DELTA_Q_FACTOR) / subgrid_height;

        let start_subgrid_x = layout.delta_h / subgrid_width;
        let start_subgrid_y = layout.delta_v / subgrid_height;
        let lx_start = (start_subgrid_x as f32 / scale as f32).round() as u32;
        let ly_start = (start_subgrid_y as f32 / scale as f32).round() as u32;
        let bx_start = start_subgrid_x & (scale - 1);
        let by_start = start_subgrid_y & (scale - 1);
        let bx_d1 = layout.delta_h % subgrid_width;
        let by_e1 = layout.delta_v % subgrid_height;

        Self {
            grid_count_h: layout.grid_count_h,
            grid_count_v: layout.grid_count_v,
            interpolation_factor,
            subgrid_width,
            subgrid_height,
            block_width,
            block_height,
            x_delta,
            y_delta,
            lx_start,
            ly_start,
            bx_start,
            by_start,
            bx_d1,
            by_e1,
            by_init_e1: by_e1 * y_delta,
            tintless_subgrid_width: subgrid_width * 2,
            tintless_subgrid_height: subgrid_height * 2,
            tintless_offset_h: lx_start * 2 * block_width + bx_start * 2 * subgrid_width + bx_d1 * 2,
            tintless_offset_v: ly_start * 2 * block_height
                + by_start * 2 * subgrid_height
                + by_e1 * 2,
        }
    }

    pub fn rolloff_geometry(&self) -> RolloffGeometry {
        RolloffGeometry {
            subgrid_width: self.tintless_subgrid_width,
            subgrid_height: self.tintless_subgrid_height,
            horizontal_offset: self.tintless_offset_h,
            vertical_offset: self.tintless_offset_v,
            table_width: MESH_POINTS_H as u32,
            table_height: MESH_POINTS_V as u32,
            subgrid_count: 1 << self.interpolation_factor,
        }
    }
}

/// Builds the tintless configuration for one frame.
///
/// Saturation limits are the stats thresholds minus one, zero when a threshold is zero.
pub fn tintless_config(
    tuning: &TintlessTuning,
    stats: &TintlessStats,
    geometry: &MeshGeometry,
) -> TintlessConfig {
    let mut thresholds = [0u8; TINTLESS_THRESHOLD_COUNT];
    for (packed, &threshold) in thresholds.iter_mut().zip(&tuning.thresholds) {
        *packed = threshold.round().clamp(0.0, f32::from(u8::MAX)) as u8;
    }

    if stats.channel_thresholds.contains(&0) {
        warn!(
            r = stats.channel_threshold(BayerChannel::R),
            gr = stats.channel_threshold(BayerChannel::Gr),
            gb = stats.channel_threshold(BayerChannel::Gb),
            b = stats.channel_threshold(BayerChannel::B),
            "Zero stats threshold, saturation limit held at zero"
        );
    }
    let saturation_limits = stats.channel_thresholds.map(|threshold| threshold.saturating_sub(1));

    TintlessConfig {
        rolloff: geometry.rolloff_geometry(),
        params: TintlessParams {
            center_weight: tuning.center_weight,
            corner_weight: tuning.corner_weight,
            accuracy: u8::from(tuning.high_accuracy_mode),
            trace_percentage: tuning.trace_percentage,
            update_delay: tuning.update_delay.min(u32::from(u8::MAX)) as u8,
            correction_strength: tuning.thresholds[0].clamp(0.0, f32::from(u8::MAX)) as u8,
            thresholds,
        },
        saturation_limits,
    }
}

impl AlscParams {
    /// Clamps the interpolated scalars to their register ranges.
    pub fn from_region(region: &LscRegionData) -> Self {
        let clamp = |value: i32, max: i32| value.clamp(0, max) as u16;
        Self {
            adaptive_gain_high: clamp(region.adaptive_gain_high, ADAPTIVE_GAIN_MAX),
            adaptive_gain_low: clamp(region.adaptive_gain_low, ADAPTIVE_GAIN_MAX),
            highlight_gain_strength: clamp(region.highlight_gain_strength, GAIN_STRENGTH_MAX),
            lowlight_gain_strength: clamp(region.lowlight_gain_strength, GAIN_STRENGTH_MAX),
            threshold_highlight: clamp(region.threshold_highlight, LIGHT_THRESHOLD_MAX),
            threshold_lowlight: clamp(region.threshold_lowlight, LIGHT_THRESHOLD_MAX),
            c_r: LUMA_COEFF_R,
            c_g: LUMA_COEFF_G,
            c_b: LUMA_COEFF_B,
            c_max: 0,
        }
    }
}

/// ALSC grid rounded to register precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlscOutput {
    pub gains: [[u16; MESH_POINTS_H]; MESH_POINTS_V],
    pub means: [[u16; MESH_POINTS_H]; MESH_POINTS_V],
}

impl AlscOutput {
    pub fn from_grid(grid: &AlscGrid) -> Self {
        let pack = |value: f32| value.round().clamp(0.0, f32::from(u16::MAX)) as u16;
        Self {
            gains: grid.gain.map(|row| row.map(pack)),
            means: grid.mean.map(|row| row.map(pack)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TintlessOutcome {
    Disabled,
    Applied,
    /// Tintless ran and failed; the resampled mesh passed through.
    Failed,
    /// Tintless was disabled and the ratio of its last success was re-applied.
    ReappliedRatio,
}

/// Tintless request input: tuning plus the statistics of this frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TintlessInput {
    pub tuning: TintlessTuning,
    pub stats: TintlessStats,
}

/// Per-point `tintless / resampled` ratio of the last successful tintless run.
#[derive(Debug, Clone, Default)]
pub struct TintlessRatioCache {
    ratios: Option<Box<MeshGains>>,
}

impl TintlessRatioCache {
    pub fn is_valid(&self) -> bool {
        self.ratios.is_some()
    }

    pub fn store(&mut self, input: &MeshGains, output: &MeshGains) {
        let ratios = self
            .ratios
            .get_or_insert_with(|| Box::new(MeshGains::default()));
        for channel in BayerChannel::ALL {
            let target = ratios.channel_mut(channel);
            let points = input.channel(channel).iter().zip(output.channel(channel));
            for (ratio, (&before, &after)) in target.iter_mut().zip(points) {
                *ratio = if before.abs() > CALIBRATION_ZERO_TOLERANCE {
                    after / before
                } else {
                    1.0
                };
            }
        }
    }

    /// Multiplies `mesh` by the cached ratios. Returns false when nothing is cached.
    pub fn apply(&self, mesh: &mut MeshGains) -> bool {
        let Some(ratios) = &self.ratios else {
            return false;
        };
        for channel in BayerChannel::ALL {
            for (value, &ratio) in mesh.channel_mut(channel).iter_mut().zip(ratios.channel(channel)) {
                *value *= ratio;
            }
        }
        true
    }

    pub fn clear(&mut self) {
        self.ratios = None;
    }
}

/// Final rolloff setting of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct LscSetting {
    pub rolloff_enable: bool,
    pub mesh: ResampledMesh,
    pub geometry: MeshGeometry,
    pub alsc_params: AlscParams,
    pub tintless: TintlessOutcome,
    pub alsc_enabled: bool,
    pub alsc: Option<AlscOutput>,
    /// Present when calibration ran for this request.
    pub calibration: Option<CalibrationReport>,
}

impl LscSetting {
    /// Q10 gains of one channel on the output grid, row-major.
    pub fn packed_channel(&self, channel: BayerChannel) -> Vec<u16> {
        let points = self.mesh.layout.points_h() * self.mesh.layout.points_v();
        self.mesh.gains.channel(channel)[..points]
            .iter()
            .copied()
            .map(gain_to_q10)
            .collect()
    }
}

/// Runs the tintless and ALSC collaborators for one frame.
pub struct LscSettingCalculator<'c, T: ?Sized, A: ?Sized> {
    tintless: &'c T,
    alsc: &'c A,
}

impl<'c, T: TintlessAlgorithm + ?Sized, A: AlscAlgorithm + ?Sized> LscSettingCalculator<'c, T, A> {
    pub fn new(tintless: &'c T, alsc: &'c A) -> Self {
        Self { tintless, alsc }
    }

    /// Applies tintless to `mesh` in place.
    pub fn apply_tintless(
        &self,
        enabled: bool,
        input: Option<&TintlessInput>,
        geometry: &MeshGeometry,
        mesh: &mut MeshGains,
        cache: &mut TintlessRatioCache,
    ) -> TintlessOutcome {
        let corrected = match input {
            Some(input) if enabled => {
                let config = tintless_config(&input.tuning, &input.stats, geometry);
                match self.tintless.process(&config, &input.stats, mesh) {
                    Ok(corrected) => Some(corrected),
                    Err(e) => {
                        warn!("Tintless failed: {}", e);
                        None
                    }
                }
            }
            None if enabled => {
                debug!("Tintless statistics unavailable");
                None
            }
            _ => None,
        };

        if let Some(corrected) = corrected {
            cache.store(mesh, &corrected);
            *mesh = corrected;
            return TintlessOutcome::Applied;
        }
        if !enabled && cache.apply(mesh) {
            debug!("Re-applied cached tintless ratio");
            return TintlessOutcome::ReappliedRatio;
        }
        if enabled {
            TintlessOutcome::Failed
        } else {
            TintlessOutcome::Disabled
        }
    }

    /// Runs ALSC. `None` means ALSC is off for this frame.
    pub fn compute_alsc(
        &self,
        enabled: bool,
        stats: Option<&StatsGrid>,
        params: &AlscParams,
    ) -> Option<AlscOutput> {
        if !enabled {
            return None;
        }
        let Some(stats) = stats else {
            debug!("AWB statistics unavailable, ALSC disabled");
            return None;
        };

        match stats.validate().and_then(|_| self.alsc.process(stats, params)) {
            Ok(grid) => Some(AlscOutput::from_grid(&grid)),
            Err(e) => {
                error!("ALSC calculation failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iq_pipeline::common::error::{IqError, Result};
    use crate::iq_pipeline::lsc::collaborators::{NoAlsc, NoTintless};
    use crate::iq_pipeline::lsc::grid::optimize_grid;
    use approx::assert_abs_diff_eq;
    use std::sync::{Arc, Mutex};

    struct ScaleTintless {
        factor: f32,
        configs: Arc<Mutex<Vec<TintlessConfig>>>,
    }

    impl TintlessAlgorithm for ScaleTintless {
        fn process(
            &self,
            config: &TintlessConfig,
            _stats: &TintlessStats,
            input: &MeshGains,
        ) -> Result<MeshGains> {
            self.configs.lock().unwrap().push(*config);
            let mut output = input.clone();
            for channel in output.channels_mut() {
                channel.iter_mut().for_each(|value| *value *= self.factor);
            }
            Ok(output)
        }
    }

    struct FixedAlsc;

    impl AlscAlgorithm for FixedAlsc {
        fn process(&self, _stats: &StatsGrid, params: &AlscParams) -> Result<AlscGrid> {
            let mut grid = AlscGrid::default();
            grid.gain[0][0] = 1023.6;
            grid.gain[12][16] = 70000.0;
            grid.mean[6][8] = f32::from(params.adaptive_gain_high);
            grid.mean[1][1] = -4.0;
            Ok(grid)
        }
    }

    fn geometry() -> MeshGeometry {
        MeshGeometry::from_layout(&optimize_grid(4000, 3000).unwrap())
    }

    fn tintless_input(thresholds: [u32; 4]) -> TintlessInput {
        TintlessInput {
            tuning: TintlessTuning::default(),
            stats: TintlessStats {
                grid: StatsGrid::new(32, 24),
                channel_thresholds: thresholds,
            },
        }
    }

    #[test]
    fn test_gain_to_q10() {
        assert_eq!(gain_to_q10(1.0), 1024);
        assert_eq!(gain_to_q10(1.5), 1536);
        assert_eq!(gain_to_q10(7.999), 8191);
        assert_eq!(gain_to_q10(9.0), 8191);
        assert_eq!(gain_to_q10(-1.0), 0);
    }

    #[test]
    fn test_geometry_from_twelve_megapixel_layout() {
        let geometry = geometry();
        assert_eq!(geometry.interpolation_factor, 1);
        assert_eq!(geometry.block_width, 126);
        assert_eq!(geometry.x_delta, 16644);
        assert_eq!((geometry.lx_start, geometry.bx_start, geometry.bx_d1), (0, 0, 8));
        assert_eq!(geometry.tintless_subgrid_width, 126);
        assert_eq!(geometry.tintless_offset_h, 16);
        assert_eq!(geometry.tintless_offset_v, 12);
        assert_eq!(geometry.rolloff_geometry().subgrid_count, 2);
    }

    #[test]
    fn test_geometry_with_subgrid_start() {
        let geometry = MeshGeometry::from_layout(&optimize_grid(4208, 3120).unwrap());
        assert_eq!(geometry.interpolation_factor, 3);
        assert_eq!((geometry.lx_start, geometry.bx_start, geometry.bx_d1), (0, 2, 2));
        assert_eq!(geometry.tintless_offset_h, 72);
        assert_eq!(geometry.y_delta, 61680);
        assert_eq!(geometry.by_init_e1, 2 * 61680);
    }

    #[test]
    fn test_tintless_config_thresholds_and_limits() {
        let mut input = tintless_input([0, 256, 1024, 1]);
        input.tuning.thresholds[0] = 6.7;
        input.tuning.thresholds[5] = 300.0;

        let config = tintless_config(&input.tuning, &input.stats, &geometry());
        assert_eq!(config.saturation_limits, [0, 255, 1023, 0]);
        assert_eq!(config.params.correction_strength, 6);
        assert_eq!(config.params.thresholds[0], 7);
        assert_eq!(config.params.thresholds[5], 255);
        assert_eq!(config.params.thresholds[15], 4);
        assert_eq!(config.rolloff.table_width, 17);
        assert_eq!(config.rolloff.table_height, 13);
    }

    #[test]
    fn test_alsc_params_clamped() {
        let region = LscRegionData {
            adaptive_gain_high: 5000,
            adaptive_gain_low: -3,
            highlight_gain_strength: 50,
            lowlight_gain_strength: 101,
            threshold_highlight: 2000,
            threshold_lowlight: 512,
            ..Default::default()
        };
        let params = AlscParams::from_region(&region);
        assert_eq!(params.adaptive_gain_high, 4095);
        assert_eq!(params.adaptive_gain_low, 0);
        assert_eq!(params.highlight_gain_strength, 50);
        assert_eq!(params.lowlight_gain_strength, 100);
        assert_eq!(params.threshold_highlight, 1023);
        assert_eq!(params.threshold_lowlight, 512);
        assert_eq!((params.c_r, params.c_g, params.c_b, params.c_max), (306, 601, 117, 0));
    }

    #[test]
    fn test_tintless_success_caches_ratio() {
        let configs = Arc::new(Mutex::new(Vec::new()));
        let tintless = ScaleTintless {
            factor: 1.25,
            configs: Arc::clone(&configs),
        };
        let calculator = LscSettingCalculator::new(&tintless, &NoAlsc);
        let mut cache = TintlessRatioCache::default();
        let input = tintless_input([64, 64, 64, 64]);

        let mut mesh = MeshGains::uniform(2.0);
        let outcome =
            calculator.apply_tintless(true, Some(&input), &geometry(), &mut mesh, &mut cache);
        assert_eq!(outcome, TintlessOutcome::Applied);
        assert_abs_diff_eq!(mesh.r[0], 2.5, epsilon = 1e-6);
        assert!(cache.is_valid());
        assert_eq!(configs.lock().unwrap().len(), 1);
        assert_eq!(configs.lock().unwrap()[0].saturation_limits, [63; 4]);

        let mut mesh = MeshGains::uniform(3.0);
        let outcome = calculator.apply_tintless(false, None, &geometry(), &mut mesh, &mut cache);
        assert_eq!(outcome, TintlessOutcome::ReappliedRatio);
        assert_abs_diff_eq!(mesh.gb[100], 3.75, epsilon = 1e-5);
        assert_eq!(configs.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_tintless_failure_passes_mesh_through() {
        let calculator = LscSettingCalculator::new(&NoTintless, &NoAlsc);
        let mut cache = TintlessRatioCache::default();
        let input = tintless_input([64; 4]);

        let mut mesh = MeshGains::uniform(2.0);
        let outcome =
            calculator.apply_tintless(true, Some(&input), &geometry(), &mut mesh, &mut cache);
        assert_eq!(outcome, TintlessOutcome::Failed);
        assert_eq!(mesh, MeshGains::uniform(2.0));
        assert!(!cache.is_valid());

        let outcome = calculator.apply_tintless(false, None, &geometry(), &mut mesh, &mut cache);
        assert_eq!(outcome, TintlessOutcome::Disabled);
        assert_eq!(mesh, MeshGains::uniform(2.0));
    }

    #[test]
    fn test_alsc_output_rounded_and_clamped() {
        let calculator = LscSettingCalculator::new(&NoTintless, &FixedAlsc);
        let params = AlscParams::from_region(&LscRegionData {
            adaptive_gain_high: 700,
            ..Default::default()
        });
        let output = calculator
            .compute_alsc(true, Some(&StatsGrid::new(16, 12)), &params)
            .unwrap();
        assert_eq!(output.gains[0][0], 1024);
        assert_eq!(output.gains[12][16], u16::MAX);
        assert_eq!(output.means[6][8], 700);
        assert_eq!(output.means[1][1], 0);
    }

    #[test]
    fn test_alsc_disabled_paths() {
        let params = AlscParams::default();
        let calculator = LscSettingCalculator::new(&NoTintless, &FixedAlsc);
        assert!(calculator.compute_alsc(false, Some(&StatsGrid::new(16, 12)), &params).is_none());
        assert!(calculator.compute_alsc(true, None, &params).is_none());

        let mut broken = StatsGrid::new(16, 12);
        broken.b.clear();
        assert!(calculator.compute_alsc(true, Some(&broken), &params).is_none());

        let failing = LscSettingCalculator::new(&NoTintless, &NoAlsc);
        assert!(failing.compute_alsc(true, Some(&StatsGrid::new(16, 12)), &params).is_none());
        assert!(matches!(
            NoAlsc.process(&StatsGrid::new(16, 12), &params),
            Err(IqError::CollaboratorFailure(_))
        ));
    }
}
