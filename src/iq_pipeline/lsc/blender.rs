use crate::iq_pipeline::interpolation::{Blendable, lerp_i32, lerp_slice};
use crate::iq_pipeline::lsc::chromatix::{LscRegionData, MeshGains};

impl Blendable for MeshGains {
    fn lerp_into(a: &Self, b: &Self, ratio: f32, out: &mut Self) {
        lerp_slice(&a.r, &b.r, ratio, &mut out.r);
        lerp_slice(&a.gr, &b.gr, ratio, &mut out.gr);
        lerp_slice(&a.gb, &b.gb, ratio, &mut out.gb);
        lerp_slice(&a.b, &b.b, ratio, &mut out.b);
    }
}

impl Blendable for LscRegionData {
    fn lerp_into(a: &Self, b: &Self, ratio: f32, out: &mut Self) {
        MeshGains::lerp_into(&a.gains, &b.gains, ratio, &mut out.gains);
        out.adaptive_gain_high = lerp_i32(a.adaptive_gain_high, b.adaptive_gain_high, ratio);
        out.adaptive_gain_low = lerp_i32(a.adaptive_gain_low, b.adaptive_gain_low, ratio);
        out.highlight_gain_strength =
            lerp_i32(a.highlight_gain_strength, b.highlight_gain_strength, ratio);
        out.lowlight_gain_strength =
            lerp_i32(a.lowlight_gain_strength, b.lowlight_gain_strength, ratio);
        out.threshold_highlight = lerp_i32(a.threshold_highlight, b.threshold_highlight, ratio);
        out.threshold_lowlight = lerp_i32(a.threshold_lowlight, b.threshold_lowlight, ratio);
    }
}
