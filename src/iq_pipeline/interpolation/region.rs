//! Trigger regions and range location

/// Start/end trigger boundary of one calibration region.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TriggerRegion {
    pub start: f32,
    pub end: f32,
}

impl TriggerRegion {
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }
}

/// Result of locating a trigger value within an ordered region list.
///
/// `start_index == end_index` means a single region is used verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InterpolationOutcome {
    pub start_index: usize,
    pub end_index: usize,
    pub ratio: f32,
}

impl InterpolationOutcome {
    pub const fn single(index: usize) -> Self {
        Self {
            start_index: index,
            end_index: index,
            ratio: 0.0,
        }
    }

    pub fn is_single(&self) -> bool {
        self.start_index == self.end_index
    }

    /// Clamps both indices into `[0, len - 1]`.
    pub fn clamped(self, len: usize) -> Self {
        let last = len.saturating_sub(1);
        Self {
            start_index: self.start_index.min(last),
            end_index: self.end_index.min(last),
            ratio: self.ratio,
        }
    }
}

/// Linear position of `value` between `start` and `end`, saturating to 0 and 1.
pub fn interpolation_ratio(value: f32, start: f32, end: f32) -> f32 {
    if value <= start {
        0.0
    } else if value >= end {
        1.0
    } else {
        (value - start) / (end - start)
    }
}

/// Locates `value` within `regions`.
///
/// A value inside a region (at or below its `end`) selects that region alone. A value in
/// the gap between region `i` and `i + 1` blends the pair with the ratio measured across
/// the gap, from `end[i]` to `start[i + 1]`. Values past the last region select it with
/// full weight. Returns `None` for an empty list.
pub fn locate(regions: &[TriggerRegion], value: f32) -> Option<InterpolationOutcome> {
    locate_by(regions, |region| *region, value)
}

/// [`locate`] over entries that carry their trigger region in a field.
pub fn locate_by<E>(
    entries: &[E],
    region_of: impl Fn(&E) -> TriggerRegion,
    value: f32,
) -> Option<InterpolationOutcome> {
    let last = entries.len().checked_sub(1)?;

    if value.is_nan() {
        return Some(InterpolationOutcome::single(0));
    }

    for index in 0..=last {
        let region = region_of(&entries[index]);
        if value <= region.end {
            return Some(InterpolationOutcome::single(index));
        }

        if index < last {
            let next = region_of(&entries[index + 1]);
            if value < next.start {
                return Some(InterpolationOutcome {
                    start_index: index,
                    end_index: index + 1,
                    ratio: interpolation_ratio(value, region.end, next.start),
                });
            }
        }
    }

    Some(InterpolationOutcome {
        start_index: last,
        end_index: last,
        ratio: 1.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn regions() -> Vec<TriggerRegion> {
        vec![
            TriggerRegion::new(0.0, 100.0),
            TriggerRegion::new(200.0, 300.0),
            TriggerRegion::new(400.0, 500.0),
        ]
    }

    #[test]
    fn test_empty_regions() {
        assert_eq!(locate(&[], 10.0), None);
    }

    #[test]
    fn test_below_first_end_selects_first() {
        let outcome = locate(&regions(), -50.0).unwrap();
        assert_eq!(outcome, InterpolationOutcome::single(0));
        let outcome = locate(&regions(), 100.0).unwrap();
        assert_eq!(outcome, InterpolationOutcome::single(0));
    }

    #[test]
    fn test_gap_blends_adjacent_regions() {
        let outcome = locate(&regions(), 150.0).unwrap();
        assert_eq!(outcome.start_index, 0);
        assert_eq!(outcome.end_index, 1);
        assert_abs_diff_eq!(outcome.ratio, 0.5, epsilon = 1e-6);

        let outcome = locate(&regions(), 475.0).unwrap();
        assert_eq!(outcome, InterpolationOutcome::single(2));

        let outcome = locate(&regions(), 325.0).unwrap();
        assert_eq!((outcome.start_index, outcome.end_index), (1, 2));
        assert_abs_diff_eq!(outcome.ratio, 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_next_start_boundary_selects_next_region() {
        let outcome = locate(&regions(), 200.0).unwrap();
        assert_eq!(outcome, InterpolationOutcome::single(1));
    }

    #[test]
    fn test_beyond_last_region() {
        let outcome = locate(&regions(), 9000.0).unwrap();
        assert_eq!(outcome.start_index, 2);
        assert_eq!(outcome.end_index, 2);
        assert_eq!(outcome.ratio, 1.0);
    }

    #[test]
    fn test_degenerate_adjacent_regions_select_lower() {
        let regions = vec![TriggerRegion::new(10.0, 10.0), TriggerRegion::new(10.0, 10.0)];
        let outcome = locate(&regions, 10.0).unwrap();
        assert_eq!(outcome, InterpolationOutcome::single(0));
        assert_eq!(outcome.ratio, 0.0);
    }

    #[test]
    fn test_nan_selects_first() {
        assert_eq!(
            locate(&regions(), f32::NAN),
            Some(InterpolationOutcome::single(0))
        );
    }

    #[test]
    fn test_monotonic_start_index() {
        let regions = regions();
        let mut previous = 0;
        let mut value = -100.0;
        while value < 700.0 {
            let outcome = locate(&regions, value).unwrap();
            assert!(outcome.start_index >= previous, "value {}", value);
            assert!(outcome.end_index < regions.len());
            assert!((0.0..=1.0).contains(&outcome.ratio));
            previous = outcome.start_index;
            value += 7.5;
        }
    }

    #[test]
    fn test_interpolation_ratio_saturates() {
        assert_eq!(interpolation_ratio(0.0, 1.0, 2.0), 0.0);
        assert_eq!(interpolation_ratio(3.0, 1.0, 2.0), 1.0);
        assert_eq!(interpolation_ratio(5.0, 5.0, 5.0), 0.0);
        assert_abs_diff_eq!(interpolation_ratio(1.25, 1.0, 2.0), 0.25);
    }

    #[test]
    fn test_clamped_outcome() {
        let outcome = InterpolationOutcome {
            start_index: 4,
            end_index: 5,
            ratio: 0.3,
        }
        .clamped(3);
        assert_eq!((outcome.start_index, outcome.end_index), (2, 2));
    }
}
