use crate::iq_pipeline::interpolation::TriggerRegion;
use crate::iq_pipeline::lsc::chromatix::{
    AecControl, AecHdrControl, AecTrigger, ControlMethod, HdrAecTrigger, LscChromatix,
};

/// Live, already validated measurements for one request.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LscTriggerInput {
    pub lens_position: f32,
    pub drc_gain: f32,
    pub exposure_time_ratio: f32,
    pub aec_sensitivity_ratio: f32,
    pub exposure_gain_ratio: f32,
    pub lux_index: f32,
    pub real_gain: f32,
    pub color_temperature: f32,
    pub led_sensitivity: f32,
    pub number_of_led: u32,
    /// Blend ratio of the first LED entry in dual-LED mode.
    pub led_first_entry_ratio: f32,
}

/// Trigger snapshot consumed by the level searches, fixed for one tree walk.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LscTriggerVector {
    pub lens_position: f32,
    pub drc_gain: f32,
    pub hdr_aec: f32,
    pub aec: f32,
    pub color_temperature: f32,
    pub led_sensitivity: f32,
    pub number_of_led: u32,
    pub led_first_entry_ratio: f32,
    pub led_sensitivity_region: TriggerRegion,
    pub control_method: ControlMethod,
}

impl LscTriggerVector {
    pub fn derive(input: &LscTriggerInput, chromatix: &LscChromatix) -> Self {
        let control_method = chromatix.control_method;
        let hdr_aec = match control_method.aec_hdr_control {
            AecHdrControl::ExpTimeRatio => input.exposure_time_ratio,
            AecHdrControl::SensitivityRatio => input.aec_sensitivity_ratio,
            AecHdrControl::ExpGainRatio => input.exposure_gain_ratio,
        };
        let aec = match control_method.aec_exp_control {
            AecControl::LuxIndex => input.lux_index,
            AecControl::Gain => input.real_gain,
        };

        Self {
            lens_position: input.lens_position,
            drc_gain: input.drc_gain,
            hdr_aec,
            aec,
            color_temperature: input.color_temperature,
            led_sensitivity: input.led_sensitivity,
            number_of_led: input.number_of_led,
            led_first_entry_ratio: input.led_first_entry_ratio,
            led_sensitivity_region: chromatix.private_info.led_sensitivity_trigger,
            control_method,
        }
    }
}

impl ControlMethod {
    pub fn hdr_aec_region(&self, trigger: &HdrAecTrigger) -> TriggerRegion {
        match self.aec_hdr_control {
            AecHdrControl::ExpTimeRatio => trigger.exp_time_trigger,
            AecHdrControl::SensitivityRatio => trigger.aec_sensitivity_trigger,
            AecHdrControl::ExpGainRatio => trigger.exp_gain_trigger,
        }
    }

    pub fn aec_region(&self, trigger: &AecTrigger) -> TriggerRegion {
        match self.aec_exp_control {
            AecControl::LuxIndex => trigger.lux_index_trigger,
            AecControl::Gain => trigger.gain_trigger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> LscTriggerInput {
        LscTriggerInput {
            exposure_time_ratio: 2.0,
            aec_sensitivity_ratio: 3.0,
            exposure_gain_ratio: 4.0,
            lux_index: 250.0,
            real_gain: 8.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_control_methods_pick_triggers() {
        let mut chromatix = LscChromatix::default();
        let vector = LscTriggerVector::derive(&input(), &chromatix);
        assert_eq!(vector.hdr_aec, 2.0);
        assert_eq!(vector.aec, 250.0);

        chromatix.control_method = ControlMethod {
            aec_hdr_control: AecHdrControl::ExpGainRatio,
            aec_exp_control: AecControl::Gain,
        };
        let vector = LscTriggerVector::derive(&input(), &chromatix);
        assert_eq!(vector.hdr_aec, 4.0);
        assert_eq!(vector.aec, 8.0);

        chromatix.control_method.aec_hdr_control = AecHdrControl::SensitivityRatio;
        let vector = LscTriggerVector::derive(&input(), &chromatix);
        assert_eq!(vector.hdr_aec, 3.0);
    }

    #[test]
    fn test_control_methods_pick_regions() {
        let hdr = HdrAecTrigger {
            exp_time_trigger: TriggerRegion::new(1.0, 2.0),
            aec_sensitivity_trigger: TriggerRegion::new(3.0, 4.0),
            exp_gain_trigger: TriggerRegion::new(5.0, 6.0),
        };
        let aec = AecTrigger {
            lux_index_trigger: TriggerRegion::new(100.0, 200.0),
            gain_trigger: TriggerRegion::new(1.0, 4.0),
        };
        let control = ControlMethod {
            aec_hdr_control: AecHdrControl::SensitivityRatio,
            aec_exp_control: AecControl::Gain,
        };
        assert_eq!(control.hdr_aec_region(&hdr), TriggerRegion::new(3.0, 4.0));
        assert_eq!(control.aec_region(&aec), TriggerRegion::new(1.0, 4.0));
    }
}
