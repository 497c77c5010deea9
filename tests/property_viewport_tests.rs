use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use tradechart::core::{
    Candle, DeviceSurface, PriceSeries, ShiftDirection, ShiftStep, Ticker, Viewport,
    ViewportConfig,
};

fn series(count: usize) -> PriceSeries {
    let start = Utc
        .with_ymd_and_hms(2023, 1, 2, 0, 0, 0)
        .single()
        .expect("start time");
    let candles = (0..count)
        .map(|i| {
            let open = 50.0 + (i % 17) as f64;
            let close = open + if i % 3 == 0 { -1.5 } else { 1.5 };
            Candle::new(
                start + Duration::hours(i as i64),
                open,
                open.max(close) + 0.5,
                open.min(close) - 0.5,
                close,
                10.0,
            )
            .expect("valid candle")
        })
        .collect();
    PriceSeries::new(Ticker::new("PROP").expect("ticker"), candles).expect("series")
}

proptest! {
    #[test]
    fn reset_window_is_within_series(len in 0usize..400, default_width in 1usize..200) {
        let series = series(len);
        let mut viewport = Viewport::new(ViewportConfig {
            default_window_candles: default_width,
            ..ViewportConfig::default()
        });
        viewport.reset_for(&series);

        match viewport.window() {
            None => prop_assert_eq!(len, 0),
            Some(window) => {
                prop_assert!(window.left() < window.right());
                prop_assert!(window.right() <= len);
                prop_assert_eq!(window.right(), len);
                prop_assert_eq!(window.width(), default_width.min(len));
            }
        }
    }

    #[test]
    fn shifts_never_leave_the_series(
        len in 1usize..300,
        step in 1usize..40,
        moves in proptest::collection::vec(any::<bool>(), 0..120)
    ) {
        let series = series(len);
        let mut viewport = Viewport::new(ViewportConfig {
            shift_step: ShiftStep::Candles(step),
            ..ViewportConfig::default()
        });
        viewport.reset_for(&series);
        let width = viewport.window().expect("window").width();

        for forward in moves {
            viewport.shift(ShiftDirection::from(forward), &series);
            let window = viewport.window().expect("window");
            prop_assert!(window.right() <= len);
            prop_assert_eq!(window.width(), width);
            prop_assert!(viewport.price_range().is_some());
        }
    }

    #[test]
    fn shift_is_idempotent_at_both_bounds(len in 1usize..300, repeats in 1usize..10) {
        let series = series(len);
        let mut viewport = Viewport::new(ViewportConfig::default());
        viewport.reset_for(&series);

        while viewport.shift(ShiftDirection::Back, &series) {}
        let at_start = viewport;
        prop_assert_eq!(at_start.window().expect("window").left(), 0);
        for _ in 0..repeats {
            prop_assert!(!viewport.shift(ShiftDirection::Back, &series));
            prop_assert_eq!(viewport, at_start);
        }

        while viewport.shift(ShiftDirection::Forward, &series) {}
        let at_end = viewport;
        prop_assert_eq!(at_end.window().expect("window").right(), len);
        for _ in 0..repeats {
            prop_assert!(!viewport.shift(ShiftDirection::Forward, &series));
            prop_assert_eq!(viewport, at_end);
        }
    }

    #[test]
    fn transform_uses_the_full_surface(
        len in 1usize..300,
        width in 1u32..4000,
        height in 1u32..4000
    ) {
        let series = series(len);
        let mut viewport = Viewport::new(ViewportConfig::default());
        viewport.reset_for(&series);
        let window = viewport.window().expect("window");
        let range = viewport.price_range().expect("range");

        let transform = viewport
            .transform(DeviceSurface::new(width, height))
            .expect("transform");
        let tolerance = 1e-6 * f64::from(width.max(height));
        prop_assert!(transform.time_to_x(window.left() as f64).abs() <= tolerance);
        prop_assert!((transform.time_to_x(window.right() as f64) - f64::from(width)).abs() <= tolerance);
        prop_assert!(transform.price_to_y(range.max()).abs() <= tolerance);
        prop_assert!((transform.price_to_y(range.min()) - f64::from(height)).abs() <= tolerance);
    }
}
