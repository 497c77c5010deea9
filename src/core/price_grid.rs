use smallvec::SmallVec;

use crate::core::PriceRange;

const MAX_GRID_LEVELS: usize = 64;

/// Grid spacing of 1, 2 or 5 times a power of ten, yielding roughly 10 to
/// 50 levels over `range`.
#[must_use]
pub fn nice_grid_step(range: PriceRange) -> f64 {
    let l10 = range.span().log10();
    let magnitude = 10_f64.powf(l10.floor() - 1.0);
    let leading = 10_f64.powf(l10 - l10.floor());
    let multiplier = if leading < 2.0 {
        1.0
    } else if leading < 5.0 {
        2.0
    } else {
        5.0
    };
    magnitude * multiplier
}

/// Price levels on the nice grid that fall inside `range`, ascending.
#[must_use]
pub fn price_grid_levels(range: PriceRange) -> SmallVec<[f64; 32]> {
    let mut levels = SmallVec::new();
    let step = nice_grid_step(range);
    if !step.is_finite() || step <= 0.0 {
        return levels;
    }

    let first = (range.min() / step).ceil() as i64;
    let last = (range.max() / step).floor() as i64;
    for k in first..=last {
        if levels.len() == MAX_GRID_LEVELS {
            break;
        }
        levels.push(k as f64 * step);
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn range(min: f64, max: f64) -> PriceRange {
        PriceRange::new(min, max).expect("range")
    }

    #[test]
    fn step_follows_leading_digit() {
        assert_relative_eq!(nice_grid_step(range(100.0, 200.0)), 10.0);
        assert_relative_eq!(nice_grid_step(range(10.0, 40.0)), 2.0);
        assert_relative_eq!(nice_grid_step(range(0.0, 60.0)), 5.0);
        assert_relative_eq!(nice_grid_step(range(1.0, 2.0)), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn levels_stay_inside_range() {
        let levels = price_grid_levels(range(95.0, 125.0));
        assert!(!levels.is_empty());
        assert!(levels.iter().all(|level| (95.0..=125.0).contains(level)));
        assert!(levels.windows(2).all(|pair| pair[0] < pair[1]));
        assert_relative_eq!(levels[0], 96.0);
    }
}
