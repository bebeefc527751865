//! Per-unit calibration against the golden table

use tracing::{debug, warn};

use crate::iq_pipeline::common::error::{IqError, Result};
use crate::iq_pipeline::interpolation::{InterpolationOutcome, locate_by};
use crate::iq_pipeline::lsc::chromatix::{BayerChannel, GoldenCctEntry, MeshGains};

/// Measured gains at or below this magnitude are treated as zero.
pub const CALIBRATION_ZERO_TOLERANCE: f32 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasuredState {
    /// Raw per-unit measured gains.
    Raw,
    /// Golden / measured ratios.
    Ratio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalibrationReport {
    /// True when this call performed the measured-to-ratio conversion.
    pub converted_now: bool,
    pub converted_points: usize,
    /// Points left raw because their measured gain was zero.
    pub skipped_zero_points: usize,
}

/// Measured calibration tables of one physical unit, indexed like the golden table.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredCalibrationSet {
    tables: Vec<MeshGains>,
    state: MeasuredState,
}

impl MeasuredCalibrationSet {
    pub fn new(tables: Vec<MeshGains>) -> Self {
        Self {
            tables,
            state: MeasuredState::Raw,
        }
    }

    pub fn tables(&self) -> &[MeshGains] {
        &self.tables
    }

    pub fn state(&self) -> MeasuredState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Replaces every non-zero measured gain with `golden / measured`, once.
    ///
    /// Later calls leave the tables untouched and report `converted_now == false`.
    pub fn convert_to_ratio(&mut self, golden: &[GoldenCctEntry]) -> Result<CalibrationReport> {
        if self.state == MeasuredState::Ratio {
            return Ok(CalibrationReport::default());
        }

        let count = golden.len().min(self.tables.len());
        if count == 0 {
            return Err(IqError::InvalidArgument(
                "calibration needs golden and measured tables".to_string(),
            ));
        }

        let mut report = CalibrationReport {
            converted_now: true,
            ..Default::default()
        };
        for (table, reference) in self.tables.iter_mut().zip(golden).take(count) {
            for channel in BayerChannel::ALL {
                let reference = reference.gains.channel(channel);
                for (measured, &golden_gain) in table.channel_mut(channel).iter_mut().zip(reference) {
                    if measured.abs() > CALIBRATION_ZERO_TOLERANCE {
                        *measured = golden_gain / *measured;
                        report.converted_points += 1;
                    } else {
                        report.skipped_zero_points += 1;
                    }
                }
            }
        }
        self.state = MeasuredState::Ratio;

        if report.skipped_zero_points > 0 {
            warn!(
                skipped = report.skipped_zero_points,
                "Measured calibration gains of zero left uncalibrated"
            );
        }
        debug!(
            tables = count,
            points = report.converted_points,
            "Measured calibration converted to ratios"
        );
        Ok(report)
    }
}

/// Golden entries bracketing `color_temperature`, limited to the first `count` entries.
pub fn golden_bracket(
    golden: &[GoldenCctEntry],
    count: usize,
    color_temperature: f32,
) -> Option<InterpolationOutcome> {
    let entries = &golden[..count.min(golden.len())];
    locate_by(entries, |entry| entry.cct_trigger, color_temperature)
        .map(|outcome| outcome.clamped(entries.len()))
}

/// Applies the unit calibration to an interpolated mesh.
///
/// `out = interpolated * ((1 - r) * measured[i1] + r * measured[i2])` per point, where
/// `(i1, i2, r)` brackets the colour temperature in the golden table. Gr and Gb are then
/// replaced by their average.
pub fn calibrate(
    interpolated: &MeshGains,
    golden: &[GoldenCctEntry],
    measured: &MeasuredCalibrationSet,
    color_temperature: f32,
    out: &mut MeshGains,
) -> Result<()> {
    let count = golden.len().min(measured.len());
    let outcome = golden_bracket(golden, count, color_temperature).ok_or_else(|| {
        IqError::InvalidArgument("calibration needs golden and measured tables".to_string())
    })?;

    let low = &measured.tables[outcome.start_index];
    let high = &measured.tables[outcome.end_index];
    let ratio = outcome.ratio;

    for channel in BayerChannel::ALL {
        let source = interpolated.channel(channel);
        let low = low.channel(channel);
        let high = high.channel(channel);
        let target = out.channel_mut(channel);
        for point in 0..target.len() {
            let factor = if outcome.is_single() {
                low[point]
            } else {
                (1.0 - ratio) * low[point] + ratio * high[point]
            };
            target[point] = source[point] * factor;
        }
    }

    for (gr, gb) in out.gr.iter_mut().zip(out.gb.iter_mut()) {
        let average = (*gr + *gb) * 0.5;
        *gr = average;
        *gb = average;
    }

    debug!(
        start = outcome.start_index,
        end = outcome.end_index,
        ratio,
        "Calibration applied"
    );
    Ok(())
}
