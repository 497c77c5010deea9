use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Affine mapping from a logical domain onto a pixel interval.
///
/// The pixel interval may be reversed (`pixel_start > pixel_end`), which is
/// how the price axis puts higher prices at smaller y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
    pixel_start: f64,
    pixel_end: f64,
}

impl LinearScale {
    pub fn new(
        domain_start: f64,
        domain_end: f64,
        pixel_start: f64,
        pixel_end: f64,
    ) -> ChartResult<Self> {
        if !domain_start.is_finite() || !domain_end.is_finite() || domain_start == domain_end {
            return Err(ChartError::InvalidData(
                "scale domain must be finite and non-zero".to_owned(),
            ));
        }
        if !pixel_start.is_finite() || !pixel_end.is_finite() {
            return Err(ChartError::InvalidData(
                "scale pixel range must be finite".to_owned(),
            ));
        }

        Ok(Self {
            domain_start,
            domain_end,
            pixel_start,
            pixel_end,
        })
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    #[must_use]
    pub fn pixel_range(self) -> (f64, f64) {
        (self.pixel_start, self.pixel_end)
    }

    /// Pixels per domain unit (negative for reversed axes).
    #[must_use]
    pub fn slope(self) -> f64 {
        (self.pixel_end - self.pixel_start) / (self.domain_end - self.domain_start)
    }

    #[must_use]
    pub fn to_pixel(self, value: f64) -> f64 {
        self.pixel_start + (value - self.domain_start) * self.slope()
    }

    #[must_use]
    pub fn to_domain(self, pixel: f64) -> f64 {
        self.domain_start + (pixel - self.pixel_start) / self.slope()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn maps_domain_edges_onto_pixel_edges() {
        let scale = LinearScale::new(50.0, 100.0, 0.0, 800.0).expect("scale");
        assert_relative_eq!(scale.to_pixel(50.0), 0.0);
        assert_relative_eq!(scale.to_pixel(100.0), 800.0);
        assert_relative_eq!(scale.to_pixel(75.0), 400.0);
    }

    #[test]
    fn reversed_pixel_range_inverts_orientation() {
        let scale = LinearScale::new(10.0, 20.0, 600.0, 0.0).expect("scale");
        assert_relative_eq!(scale.to_pixel(20.0), 0.0);
        assert_relative_eq!(scale.to_pixel(10.0), 600.0);
        assert!(scale.slope() < 0.0);
        assert_relative_eq!(scale.to_domain(300.0), 15.0);
    }

    #[test]
    fn degenerate_domain_is_rejected() {
        assert!(LinearScale::new(1.0, 1.0, 0.0, 10.0).is_err());
        assert!(LinearScale::new(f64::NAN, 1.0, 0.0, 10.0).is_err());
    }
}
