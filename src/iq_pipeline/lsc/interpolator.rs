use tracing::{debug, instrument};

use crate::iq_pipeline::common::error::{IqError, Result};
use crate::iq_pipeline::interpolation::{
    ChildSelection, InterpolationTree, LinearBlender, TreeLevel,
};
use crate::iq_pipeline::lsc::calibration::{CalibrationReport, MeasuredCalibrationSet, calibrate};
use crate::iq_pipeline::lsc::chromatix::{LscChromatix, LscRegionData};
use crate::iq_pipeline::lsc::search::{
    LSC_LEVEL_FAN_OUT, LscNode, search_aec, search_cct, search_drc_gain, search_hdr_aec,
    search_led, search_lens_position,
};
use crate::iq_pipeline::lsc::triggers::{LscTriggerInput, LscTriggerVector};

type LscSearch<'a> = fn(&LscNode<'a>, &LscTriggerVector) -> ChildSelection<LscNode<'a>>;
type LscTree<'a> = InterpolationTree<'a, LscNode<'a>, LscRegionData, LscTriggerVector>;

/// Interpolates one [`LscRegionData`] out of an LSC tuning tree.
///
/// Owns the node arena for the lifetime of a stream; every request rebuilds the tree in
/// place.
pub struct LscInterpolator<'a> {
    tree: LscTree<'a>,
    blender: LinearBlender,
}

impl<'a> LscInterpolator<'a> {
    pub fn new() -> Result<Self> {
        let searches: [LscSearch<'a>; 6] = [
            search_lens_position as LscSearch<'a>,
            search_drc_gain as LscSearch<'a>,
            search_hdr_aec as LscSearch<'a>,
            search_led as LscSearch<'a>,
            search_aec as LscSearch<'a>,
            search_cct as LscSearch<'a>,
        ];
        let levels = searches
            .into_iter()
            .zip(LSC_LEVEL_FAN_OUT)
            .map(|(search, fan_out)| TreeLevel::new(search, fan_out))
            .collect();

        Ok(Self {
            tree: InterpolationTree::new(levels)?,
            blender: LinearBlender,
        })
    }

    pub fn node_count(&self) -> usize {
        self.tree.node_count()
    }

    pub fn non_leaf_count(&self) -> usize {
        self.tree.non_leaf_count()
    }

    /// Walks the tree for `input` and writes the result to `out`.
    ///
    /// With `measured` present the interpolated gains are calibrated against the golden
    /// table, converting the measured set to ratios on first use. Scalars always come
    /// from the interpolated block.
    #[instrument(skip_all, fields(cct = input.color_temperature))]
    pub fn interpolate(
        &mut self,
        chromatix: &'a LscChromatix,
        input: &LscTriggerInput,
        measured: Option<&mut MeasuredCalibrationSet>,
        out: &mut LscRegionData,
    ) -> Result<Option<CalibrationReport>> {
        if chromatix.core.lens_position_data.is_empty() {
            return Err(IqError::InvalidArgument(
                "tuning tree has no lens position data".to_string(),
            ));
        }

        let triggers = LscTriggerVector::derive(input, chromatix);
        self.tree.build(LscNode::Root(chromatix), &triggers)?;
        let interpolated = self.tree.interpolate(&self.blender)?;
        out.copy_scalars_from(interpolated);

        let Some(measured) = measured else {
            out.gains.clone_from(&interpolated.gains);
            return Ok(None);
        };

        let report = measured.convert_to_ratio(&chromatix.golden)?;
        calibrate(
            &interpolated.gains,
            &chromatix.golden,
            measured,
            triggers.color_temperature,
            &mut out.gains,
        )?;
        debug!(
            converted_now = report.converted_now,
            "Interpolated gains calibrated"
        );
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iq_pipeline::interpolation::TriggerRegion;
    use crate::iq_pipeline::lsc::calibration::MeasuredState;
    use crate::iq_pipeline::lsc::chromatix::{
        AecEntry, CctEntry, DrcGainEntry, GoldenCctEntry, HdrAecEntry, LedEntry,
        LensPositionEntry, LscCore, MeshGains,
    };
    use approx::assert_abs_diff_eq;

    fn region(gain: f32, scalar: i32) -> LscRegionData {
        LscRegionData {
            gains: MeshGains::uniform(gain),
            adaptive_gain_high: scalar,
            ..Default::default()
        }
    }

    /// One entry on every level except CCT, which has two regions.
    fn chromatix() -> LscChromatix {
        let aec = AecEntry {
            cct_data: vec![
                CctEntry {
                    cct_trigger: TriggerRegion::new(2000.0, 3000.0),
                    region_data: region(1.0, 100),
                },
                CctEntry {
                    cct_trigger: TriggerRegion::new(5000.0, 6000.0),
                    region_data: region(3.0, 300),
                },
            ],
            ..Default::default()
        };
        LscChromatix {
            core: LscCore {
                lens_position_data: vec![LensPositionEntry {
                    drc_gain_data: vec![DrcGainEntry {
                        hdr_aec_data: vec![HdrAecEntry {
                            led_idx_data: vec![LedEntry {
                                aec_data: vec![aec],
                            }],
                            ..Default::default()
                        }],
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
            },
            golden: vec![
                GoldenCctEntry {
                    cct_trigger: TriggerRegion::new(2000.0, 3000.0),
                    gains: MeshGains::uniform(2.0),
                },
                GoldenCctEntry {
                    cct_trigger: TriggerRegion::new(5000.0, 6000.0),
                    gains: MeshGains::uniform(2.0),
                },
            ],
            ..Default::default()
        }
    }

    fn input(color_temperature: f32) -> LscTriggerInput {
        LscTriggerInput {
            color_temperature,
            ..Default::default()
        }
    }

    #[test]
    fn test_arena_shape() {
        let interpolator = LscInterpolator::new().unwrap();
        assert_eq!(interpolator.node_count(), 183);
        assert_eq!(interpolator.non_leaf_count(), 87);
    }

    #[test]
    fn test_interpolates_between_cct_regions() {
        let chromatix = chromatix();
        let mut interpolator = LscInterpolator::new().unwrap();
        let mut out = LscRegionData::default();

        let report = interpolator
            .interpolate(&chromatix, &input(3500.0), None, &mut out)
            .unwrap();
        assert!(report.is_none());
        assert_abs_diff_eq!(out.gains.r[0], 1.5, epsilon = 1e-5);
        assert_eq!(out.adaptive_gain_high, 150);
    }

    #[test]
    fn test_region_end_selects_lower_region_verbatim() {
        let chromatix = chromatix();
        let mut interpolator = LscInterpolator::new().unwrap();
        let mut out = LscRegionData::default();

        interpolator
            .interpolate(&chromatix, &input(3000.0), None, &mut out)
            .unwrap();
        let lower = &chromatix.core.lens_position_data[0].drc_gain_data[0].hdr_aec_data[0]
            .led_idx_data[0]
            .aec_data[0]
            .cct_data[0];
        assert_eq!(out, lower.region_data);
    }

    #[test]
    fn test_calibration_applied_once_per_set() {
        let chromatix = chromatix();
        let mut interpolator = LscInterpolator::new().unwrap();
        let mut measured =
            MeasuredCalibrationSet::new(vec![MeshGains::uniform(4.0), MeshGains::uniform(4.0)]);
        let mut out = LscRegionData::default();

        let report = interpolator
            .interpolate(&chromatix, &input(2500.0), Some(&mut measured), &mut out)
            .unwrap()
            .unwrap();
        assert!(report.converted_now);
        assert_eq!(measured.state(), MeasuredState::Ratio);
        // 1.0 * golden 2.0 / measured 4.0
        assert_abs_diff_eq!(out.gains.b[10], 0.5, epsilon = 1e-6);
        assert_eq!(out.adaptive_gain_high, 100);

        let report = interpolator
            .interpolate(&chromatix, &input(2500.0), Some(&mut measured), &mut out)
            .unwrap()
            .unwrap();
        assert!(!report.converted_now);
        assert_abs_diff_eq!(out.gains.b[10], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_tree_rejected() {
        let chromatix = LscChromatix::default();
        let mut interpolator = LscInterpolator::new().unwrap();
        let mut out = LscRegionData::default();
        assert!(matches!(
            interpolator.interpolate(&chromatix, &input(3000.0), None, &mut out),
            Err(IqError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_missing_branch_fails_build() {
        let mut chromatix = chromatix();
        chromatix.core.lens_position_data[0].drc_gain_data[0].hdr_aec_data[0].led_idx_data[0]
            .aec_data[0]
            .cct_data
            .clear();
        let mut interpolator = LscInterpolator::new().unwrap();
        let mut out = LscRegionData::default();
        assert!(matches!(
            interpolator.interpolate(&chromatix, &input(3000.0), None, &mut out),
            Err(IqError::TreeBuildFailure { level: 6, .. })
        ));
    }
}
