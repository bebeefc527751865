use crate::iq_pipeline::common::error::{IqError, Result};

/// A fixed-shape parameter block that can be blended field by field.
pub trait Blendable: Clone {
    /// Writes `a * (1 - ratio) + b * ratio` into `out` for every field.
    fn lerp_into(a: &Self, b: &Self, ratio: f32, out: &mut Self);
}

/// Merges two parameter blocks of the same shape.
pub trait LeafBlender<P> {
    fn blend(&self, a: &P, b: &P, ratio: f32, out: &mut P) -> Result<()>;
}

/// Linear blender with copy shortcuts for shared operands and exact endpoints.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearBlender;

impl<P: Blendable> LeafBlender<P> for LinearBlender {
    fn blend(&self, a: &P, b: &P, ratio: f32, out: &mut P) -> Result<()> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(IqError::InvalidRatio(ratio));
        }

        if std::ptr::eq(a, b) || ratio == 0.0 {
            out.clone_from(a);
        } else if ratio == 1.0 {
            out.clone_from(b);
        } else {
            P::lerp_into(a, b, ratio, out);
        }
        Ok(())
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, ratio: f32) -> f32 {
    a * (1.0 - ratio) + b * ratio
}

/// Integer fields are blended in floating point and rounded.
#[inline]
pub fn lerp_i32(a: i32, b: i32, ratio: f32) -> i32 {
    lerp(a as f32, b as f32, ratio).round() as i32
}

pub fn lerp_slice(a: &[f32], b: &[f32], ratio: f32, out: &mut [f32]) {
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = lerp(x, y, ratio);
    }
}
