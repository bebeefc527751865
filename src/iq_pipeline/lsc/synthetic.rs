//! Deterministic synthetic LSC data.
//!
//! Small builders for tuning trees, golden and measured tables and statistics, used by
//! the demo binary, the benchmarks and the tests. Everything is a pure function of its
//! arguments.

use crate::iq_pipeline::interpolation::TriggerRegion;
use crate::iq_pipeline::lsc::calibration::MeasuredCalibrationSet;
use crate::iq_pipeline::lsc::chromatix::{
    AecEntry, AecTrigger, BayerChannel, CctEntry, DrcGainEntry, EnableSection, GoldenCctEntry,
    HdrAecEntry, HdrAecTrigger, LedEntry, LensPositionEntry, LscChromatix, LscCore,
    LscRegionData, MESH_POINTS_H, MESH_POINTS_V, MeshGains, PrivateInfo,
};
use crate::iq_pipeline::lsc::collaborators::{StatsGrid, TintlessStats, TintlessTuning};
use crate::iq_pipeline::lsc::setting::TintlessInput;

/// Illuminant regions of the synthetic tree: A, TL84, D65.
pub const CCT_REGIONS: [(f32, f32); 3] = [(2600.0, 3000.0), (3800.0, 4200.0), (6000.0, 7000.0)];

/// Per-channel tint of each illuminant, R, Gr, Gb, B.
const CCT_TINTS: [[f32; 4]; 3] = [
    [0.90, 1.0, 1.0, 1.25],
    [1.00, 1.0, 1.0, 1.10],
    [1.10, 1.0, 1.0, 0.95],
];

/// Radial falloff compensation: `1 + strength * r^2`, with `r` normalised to 1 at the
/// corners, scaled per channel by `tint`.
pub fn vignetting_mesh(strength: f32, tint: [f32; 4]) -> MeshGains {
    let mut mesh = MeshGains::default();
    let center_x = (MESH_POINTS_H - 1) as f32 / 2.0;
    let center_y = (MESH_POINTS_V - 1) as f32 / 2.0;
    for (channel, scale) in BayerChannel::ALL.into_iter().zip(tint) {
        let values = mesh.channel_mut(channel);
        for y in 0..MESH_POINTS_V {
            for x in 0..MESH_POINTS_H {
                let dx = (x as f32 - center_x) / center_x;
                let dy = (y as f32 - center_y) / center_y;
                let r2 = (dx * dx + dy * dy) / 2.0;
                values[y * MESH_POINTS_H + x] = scale * (1.0 + strength * r2);
            }
        }
    }
    mesh
}

fn region_data(strength: f32, tint: [f32; 4], scalar_bias: i32) -> LscRegionData {
    LscRegionData {
        gains: vignetting_mesh(strength, tint),
        adaptive_gain_high: 1024 + scalar_bias,
        adaptive_gain_low: 512 + scalar_bias,
        highlight_gain_strength: 40,
        lowlight_gain_strength: 60,
        threshold_highlight: 900,
        threshold_lowlight: 64 + scalar_bias,
    }
}

fn cct_entries(strength: f32, scalar_bias: i32) -> Vec<CctEntry> {
    CCT_REGIONS
        .iter()
        .zip(CCT_TINTS)
        .map(|(&(start, end), tint)| CctEntry {
            cct_trigger: TriggerRegion::new(start, end),
            region_data: region_data(strength, tint, scalar_bias),
        })
        .collect()
}

/// Full six-level tuning tree.
///
/// Falloff strength grows with lens position and DRC gain and shrinks in low light, so
/// every level changes the result. Each HDR AEC entry carries three LED slots.
pub fn synthetic_chromatix() -> LscChromatix {
    let lens_positions = [(0.0, 100.0), (300.0, 400.0)];
    let drc_gains = [(1.0, 1.5), (3.0, 4.0)];
    let hdr_ratios = [(1.0, 1.0), (8.0, 16.0)];
    let lux_indexes = [(0.0, 250.0), (400.0, 500.0)];

    let lens_position_data = lens_positions
        .iter()
        .enumerate()
        .map(|(lens_index, &(start, end))| LensPositionEntry {
            lens_position_trigger: TriggerRegion::new(start, end),
            drc_gain_data: drc_gains
                .iter()
                .enumerate()
                .map(|(drc_index, &(start, end))| DrcGainEntry {
                    drc_gain_trigger: TriggerRegion::new(start, end),
                    hdr_aec_data: hdr_ratios
                        .iter()
                        .map(|&(start, end)| {
                            let region = TriggerRegion::new(start, end);
                            HdrAecEntry {
                                hdr_aec_trigger: HdrAecTrigger {
                                    exp_time_trigger: region,
                                    aec_sensitivity_trigger: region,
                                    exp_gain_trigger: region,
                                },
                                led_idx_data: (0..3)
                                    .map(|led| LedEntry {
                                        aec_data: lux_indexes
                                            .iter()
                                            .enumerate()
                                            .map(|(lux_index, &(start, end))| {
                                                let strength = 0.8
                                                    + 0.3 * lens_index as f32
                                                    + 0.2 * drc_index as f32
                                                    - 0.2 * lux_index as f32;
                                                AecEntry {
                                                    aec_trigger: AecTrigger {
                                                        lux_index_trigger: TriggerRegion::new(
                                                            start, end,
                                                        ),
                                                        gain_trigger: TriggerRegion::new(
                                                            1.0 + lux_index as f32 * 8.0,
                                                            2.0 + lux_index as f32 * 8.0,
                                                        ),
                                                    },
                                                    cct_data: cct_entries(strength, 16 * led),
                                                }
                                            })
                                            .collect(),
                                    })
                                    .collect(),
                            }
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    LscChromatix {
        private_info: PrivateInfo {
            led_sensitivity_trigger: TriggerRegion::new(100.0, 400.0),
        },
        core: LscCore { lens_position_data },
        golden: golden_table(),
        enable: EnableSection {
            rolloff_enable: true,
            alsc_enable: true,
        },
        ..Default::default()
    }
}

/// Golden reference gains for the three synthetic illuminants.
pub fn golden_table() -> Vec<GoldenCctEntry> {
    CCT_REGIONS
        .iter()
        .zip(CCT_TINTS)
        .map(|(&(start, end), tint)| GoldenCctEntry {
            cct_trigger: TriggerRegion::new(start, end),
            gains: vignetting_mesh(1.0, tint),
        })
        .collect()
}

/// Measured tables of a unit that deviates from golden by up to `variation`, tilted
/// left to right.
pub fn measured_tables(golden: &[GoldenCctEntry], variation: f32) -> MeasuredCalibrationSet {
    let tables = golden
        .iter()
        .map(|entry| {
            let mut table = entry.gains.clone();
            for channel in table.channels_mut() {
                for (point, value) in channel.iter_mut().enumerate() {
                    let x = (point % MESH_POINTS_H) as f32 / (MESH_POINTS_H - 1) as f32;
                    *value *= 1.0 + variation * (2.0 * x - 1.0);
                }
            }
            table
        })
        .collect();
    MeasuredCalibrationSet::new(tables)
}

/// Flat statistics grid at `level` in every channel.
pub fn uniform_stats(columns: usize, rows: usize, level: f32) -> StatsGrid {
    let cells = columns * rows;
    StatsGrid {
        columns,
        rows,
        r: vec![level; cells],
        g: vec![level; cells],
        b: vec![level; cells],
    }
}

pub fn tintless_input(threshold: u32) -> TintlessInput {
    TintlessInput {
        tuning: TintlessTuning::default(),
        stats: TintlessStats {
            grid: uniform_stats(32, 24, 128.0),
            channel_thresholds: [threshold; 4],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_vignetting_mesh_shape() {
        let mesh = vignetting_mesh(1.0, [1.0, 1.0, 1.0, 2.0]);
        let center = (MESH_POINTS_V / 2) * MESH_POINTS_H + MESH_POINTS_H / 2;
        assert_abs_diff_eq!(mesh.r[center], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(mesh.r[0], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(mesh.b[0], 4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_chromatix_shape() {
        let chromatix = synthetic_chromatix();
        let lens = &chromatix.core.lens_position_data;
        assert_eq!(lens.len(), 2);
        let hdr = &lens[0].drc_gain_data[1].hdr_aec_data[0];
        assert_eq!(hdr.led_idx_data.len(), 3);
        assert_eq!(hdr.led_idx_data[2].aec_data[1].cct_data.len(), 3);
        assert_eq!(chromatix.golden.len(), 3);
    }

    #[test]
    fn test_measured_tables_tilt() {
        let golden = golden_table();
        let measured = measured_tables(&golden, 0.1);
        assert_eq!(measured.len(), 3);
        let table = &measured.tables()[1];
        assert_abs_diff_eq!(table.gr[0], golden[1].gains.gr[0] * 0.9, epsilon = 1e-5);
        assert_abs_diff_eq!(table.gr[16], golden[1].gains.gr[16] * 1.1, epsilon = 1e-5);
    }
}
