//! Level searches of the LSC tuning tree
//!
//! Six levels: lens position, DRC gain, HDR AEC, LED index, AEC, colour temperature.

use tracing::warn;

use crate::iq_pipeline::interpolation::{
    ChildSelection, InterpolationOutcome, TreePayload, TriggerRegion, interpolation_ratio,
    locate_by,
};
use crate::iq_pipeline::lsc::chromatix::{
    AecEntry, CctEntry, DrcGainEntry, HdrAecEntry, LedEntry, LensPositionEntry, LscChromatix,
    LscRegionData,
};
use crate::iq_pipeline::lsc::triggers::LscTriggerVector;

/// Fan-out of each LSC level, root to leaves.
pub const LSC_LEVEL_FAN_OUT: [usize; 6] = [2, 2, 2, 3, 2, 2];

/// A node of the LSC tuning tree.
#[derive(Debug, Clone, Copy)]
pub enum LscNode<'a> {
    Root(&'a LscChromatix),
    LensPosition(&'a LensPositionEntry),
    DrcGain(&'a DrcGainEntry),
    HdrAec(&'a HdrAecEntry),
    Led(&'a LedEntry),
    Aec(&'a AecEntry),
    Cct(&'a CctEntry),
}

impl<'a> TreePayload<'a, LscRegionData> for LscNode<'a> {
    fn leaf_data(&self) -> Option<&'a LscRegionData> {
        match *self {
            LscNode::Cct(entry) => Some(&entry.region_data),
            _ => None,
        }
    }
}

fn select<'a, E>(
    entries: &'a [E],
    region_of: impl Fn(&E) -> TriggerRegion,
    value: f32,
    wrap: fn(&'a E) -> LscNode<'a>,
) -> ChildSelection<LscNode<'a>> {
    match locate_by(entries, region_of, value) {
        Some(outcome) => ChildSelection::from_outcome(outcome.clamped(entries.len()), |index| {
            entries.get(index).map(wrap)
        }),
        None => ChildSelection::none(),
    }
}

pub fn search_lens_position<'a>(
    parent: &LscNode<'a>,
    triggers: &LscTriggerVector,
) -> ChildSelection<LscNode<'a>> {
    let LscNode::Root(chromatix) = *parent else {
        return ChildSelection::none();
    };
    select(
        &chromatix.core.lens_position_data,
        |entry| entry.lens_position_trigger,
        triggers.lens_position,
        LscNode::LensPosition,
    )
}

pub fn search_drc_gain<'a>(
    parent: &LscNode<'a>,
    triggers: &LscTriggerVector,
) -> ChildSelection<LscNode<'a>> {
    let LscNode::LensPosition(entry) = *parent else {
        return ChildSelection::none();
    };
    select(
        &entry.drc_gain_data,
        |entry| entry.drc_gain_trigger,
        triggers.drc_gain,
        LscNode::DrcGain,
    )
}

pub fn search_hdr_aec<'a>(
    parent: &LscNode<'a>,
    triggers: &LscTriggerVector,
) -> ChildSelection<LscNode<'a>> {
    let LscNode::DrcGain(entry) = *parent else {
        return ChildSelection::none();
    };
    let control = triggers.control_method;
    select(
        &entry.hdr_aec_data,
        |entry| control.hdr_aec_region(&entry.hdr_aec_trigger),
        triggers.hdr_aec,
        LscNode::HdrAec,
    )
}

/// LED slot selection.
///
/// With no LED or a single slot, slot 0 is used. One or two LEDs compare the live LED
/// sensitivity against the global sensitivity region: at or past its end selects slot 1,
/// at or before its start slot 0, anything between blends the two. In dual-LED mode a
/// non-zero first-entry ratio layers slot 2 on top when at least three slots exist.
pub fn search_led<'a>(
    parent: &LscNode<'a>,
    triggers: &LscTriggerVector,
) -> ChildSelection<LscNode<'a>> {
    let LscNode::HdrAec(entry) = *parent else {
        return ChildSelection::none();
    };
    let slots = &entry.led_idx_data;
    if slots.is_empty() {
        return ChildSelection::none();
    }

    let outcome = if triggers.number_of_led == 0 || slots.len() == 1 {
        InterpolationOutcome::single(0)
    } else {
        match triggers.number_of_led {
            1 | 2 => {
                let region = triggers.led_sensitivity_region;
                let sensitivity = triggers.led_sensitivity;
                if sensitivity >= region.end {
                    InterpolationOutcome::single(1)
                } else if sensitivity <= region.start {
                    InterpolationOutcome::single(0)
                } else {
                    InterpolationOutcome {
                        start_index: 0,
                        end_index: 1,
                        ratio: interpolation_ratio(sensitivity, region.start, region.end),
                    }
                }
            }
            count => {
                warn!(number_of_led = count, "Unsupported LED count, using first LED slot");
                InterpolationOutcome::single(0)
            }
        }
    };

    let mut selection = ChildSelection::from_outcome(outcome.clamped(slots.len()), |index| {
        slots.get(index).map(LscNode::Led)
    });

    let second_ratio = if triggers.number_of_led == 2 {
        triggers.led_first_entry_ratio
    } else {
        0.0
    };
    if second_ratio != 0.0 && slots.len() >= 3 {
        selection.push(LscNode::Led(&slots[2]), 1.0 - second_ratio);
    }
    selection
}

pub fn search_aec<'a>(
    parent: &LscNode<'a>,
    triggers: &LscTriggerVector,
) -> ChildSelection<LscNode<'a>> {
    let LscNode::Led(entry) = *parent else {
        return ChildSelection::none();
    };
    let control = triggers.control_method;
    select(
        &entry.aec_data,
        |entry| control.aec_region(&entry.aec_trigger),
        triggers.aec,
        LscNode::Aec,
    )
}

pub fn search_cct<'a>(
    parent: &LscNode<'a>,
    triggers: &LscTriggerVector,
) -> ChildSelection<LscNode<'a>> {
    let LscNode::Aec(entry) = *parent else {
        return ChildSelection::none();
    };
    select(
        &entry.cct_data,
        |entry| entry.cct_trigger,
        triggers.color_temperature,
        LscNode::Cct,
    )
}
