use approx::assert_relative_eq;
use chrono::{Duration, TimeZone, Utc};
use tradechart::core::{
    Candle, DeviceSurface, IndexWindow, PriceRange, PriceSeries, ShiftDirection, ShiftStep, Ticker,
    Viewport, ViewportConfig,
};

fn series(count: usize) -> PriceSeries {
    let start = Utc
        .with_ymd_and_hms(2022, 12, 1, 0, 0, 0)
        .single()
        .expect("start time");
    let candles = (0..count)
        .map(|i| {
            let open = 100.0 + i as f64;
            let close = if i % 2 == 0 { open + 2.0 } else { open - 2.0 };
            Candle::new(
                start + Duration::days(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1_000.0,
            )
            .expect("valid candle")
        })
        .collect();
    PriceSeries::new(Ticker::new("GAZP").expect("ticker"), candles).expect("series")
}

fn window(left: usize, right: usize) -> Option<IndexWindow> {
    Some(IndexWindow::new(left, right).expect("window"))
}

#[test]
fn reset_shows_trailing_default_window() {
    let series = series(100);
    let mut viewport = Viewport::new(ViewportConfig::default());
    viewport.reset_for(&series);
    assert_eq!(viewport.window(), window(50, 100));
    assert!(viewport.auto_fit());
}

#[test]
fn short_series_is_shown_whole() {
    let series = series(7);
    let mut viewport = Viewport::new(ViewportConfig::default());
    viewport.reset_for(&series);
    assert_eq!(viewport.window(), window(0, 7));
}

#[test]
fn single_candle_series_yields_one_slot_window() {
    let series = series(1);
    let mut viewport = Viewport::new(ViewportConfig::default());
    viewport.reset_for(&series);
    assert_eq!(viewport.window(), window(0, 1));
    assert!(viewport.price_range().is_some());
}

#[test]
fn empty_series_yields_empty_window() {
    let series = PriceSeries::empty(Ticker::new("EMPTY").expect("ticker"));
    let mut viewport = Viewport::new(ViewportConfig::default());
    viewport.reset_for(&series);
    assert!(viewport.is_empty());
    assert!(viewport.price_range().is_none());
    assert!(!viewport.shift(ShiftDirection::Back, &series));
    assert!(viewport.transform(DeviceSurface::new(800, 600)).is_none());
}

#[test]
fn backward_shift_clamps_at_zero_and_stays() {
    let series = series(100);
    let mut viewport = Viewport::new(ViewportConfig::default());
    viewport.reset_for(&series);

    assert!(viewport.shift(ShiftDirection::Back, &series));
    assert_eq!(viewport.window(), window(49, 99));

    for _ in 0..50 {
        viewport.shift(ShiftDirection::Back, &series);
    }
    assert_eq!(viewport.window(), window(0, 50));

    assert!(!viewport.shift(ShiftDirection::Back, &series));
    assert!(!viewport.shift(ShiftDirection::Back, &series));
    assert_eq!(viewport.window(), window(0, 50));
}

#[test]
fn forward_shift_at_latest_candle_is_noop() {
    let series = series(100);
    let mut viewport = Viewport::new(ViewportConfig::default());
    viewport.reset_for(&series);

    let before = viewport;
    assert!(!viewport.shift(ShiftDirection::Forward, &series));
    assert_eq!(viewport, before);

    viewport.shift(ShiftDirection::Back, &series);
    assert!(viewport.shift(ShiftDirection::Forward, &series));
    assert_eq!(viewport.window(), window(50, 100));
}

#[test]
fn window_fraction_step_moves_partially_at_bound() {
    let config = ViewportConfig {
        shift_step: ShiftStep::WindowFraction(0.4),
        ..ViewportConfig::default()
    };
    let series = series(100);
    let mut viewport = Viewport::new(config);
    viewport.reset_for(&series);

    assert!(viewport.shift(ShiftDirection::Back, &series));
    assert_eq!(viewport.window(), window(30, 80));
    assert!(viewport.shift(ShiftDirection::Back, &series));
    assert_eq!(viewport.window(), window(10, 60));
    assert!(viewport.shift(ShiftDirection::Back, &series));
    assert_eq!(viewport.window(), window(0, 50));
}

#[test]
fn auto_fit_pads_visible_extremes() {
    let series = series(100);
    let mut viewport = Viewport::new(ViewportConfig::default());
    viewport.reset_for(&series);

    let (low, high) = series
        .price_extent(viewport.window().expect("window"))
        .expect("extent");
    let range = viewport.price_range().expect("range");
    let pad = (high - low) * 0.05;
    assert_relative_eq!(range.min(), low - pad, epsilon = 1e-9);
    assert_relative_eq!(range.max(), high + pad, epsilon = 1e-9);
}

#[test]
fn shift_refits_price_range_while_auto_fit_is_on() {
    let series = series(100);
    let mut viewport = Viewport::new(ViewportConfig::default());
    viewport.reset_for(&series);
    let before = viewport.price_range().expect("range");

    viewport.shift(ShiftDirection::Back, &series);
    let after = viewport.price_range().expect("range");
    assert!(after.min() < before.min());
    assert_ne!(after, before);
}

#[test]
fn pinned_price_range_survives_shift_until_auto_fit_returns() {
    let series = series(100);
    let mut viewport = Viewport::new(ViewportConfig::default());
    viewport.reset_for(&series);

    let pinned = PriceRange::new(0.0, 500.0).expect("range");
    viewport.set_price_range(pinned);
    viewport.shift(ShiftDirection::Back, &series);
    assert_eq!(viewport.price_range(), Some(pinned));
    assert!(!viewport.auto_fit());

    viewport.enable_auto_fit(&series);
    assert!(viewport.auto_fit());
    assert_ne!(viewport.price_range(), Some(pinned));
}

#[test]
fn reset_discards_pinned_range() {
    let series = series(100);
    let mut viewport = Viewport::new(ViewportConfig::default());
    viewport.reset_for(&series);
    viewport.set_price_range(PriceRange::new(0.0, 500.0).expect("range"));

    viewport.reset_for(&series);
    assert!(viewport.auto_fit());
    assert_ne!(viewport.price_range().expect("range").min(), 0.0);
}

#[test]
fn window_width_is_clamped_and_right_anchored() {
    let series = series(100);
    let mut viewport = Viewport::new(ViewportConfig::default());
    viewport.reset_for(&series);
    viewport.shift(ShiftDirection::Back, &series);

    assert!(viewport.set_window_width(20, &series));
    assert_eq!(viewport.window(), window(79, 99));

    assert!(viewport.set_window_width(0, &series));
    assert_eq!(viewport.window(), window(98, 99));

    assert!(viewport.set_window_width(1_000, &series));
    assert_eq!(viewport.window(), window(0, 100));
    assert!(!viewport.set_window_width(1_000, &series));
}

#[test]
fn transform_maps_window_edges_to_surface_edges() {
    let series = series(100);
    let mut viewport = Viewport::new(ViewportConfig::default());
    viewport.reset_for(&series);
    let range = viewport.price_range().expect("range");

    let transform = viewport
        .transform(DeviceSurface::new(800, 600))
        .expect("transform");
    assert_relative_eq!(transform.time_to_x(50.0), 0.0);
    assert_relative_eq!(transform.time_to_x(100.0), 800.0);
    assert_relative_eq!(transform.price_to_y(range.max()), 0.0, epsilon = 1e-9);
    assert_relative_eq!(transform.price_to_y(range.min()), 600.0, epsilon = 1e-9);
    assert_relative_eq!(transform.slot_width_px(), 16.0);
}

#[test]
fn config_rejects_zero_window_and_step() {
    let zero_window = ViewportConfig {
        default_window_candles: 0,
        ..ViewportConfig::default()
    };
    assert!(zero_window.validate().is_err());

    let zero_step = ViewportConfig {
        shift_step: ShiftStep::Candles(0),
        ..ViewportConfig::default()
    };
    assert!(zero_step.validate().is_err());

    let bad_fraction = ViewportConfig {
        shift_step: ShiftStep::WindowFraction(f64::NAN),
        ..ViewportConfig::default()
    };
    assert!(bad_fraction.validate().is_err());
}

#[test]
fn flat_series_at_large_prices_still_maps_to_the_surface() {
    let start = Utc
        .with_ymd_and_hms(2022, 12, 1, 0, 0, 0)
        .single()
        .expect("start time");
    let price = 3.0e13;
    let candles = (0..10)
        .map(|i| {
            Candle::new(start + Duration::days(i), price, price, price, price, 1.0)
                .expect("flat candle")
        })
        .collect();
    let flat = PriceSeries::new(Ticker::new("RUAL").expect("ticker"), candles).expect("series");

    let mut viewport = Viewport::new(ViewportConfig::default());
    viewport.reset_for(&flat);

    let range = viewport.price_range().expect("fitted range");
    assert!(range.min() < price && price < range.max());
    let transform = viewport
        .transform(DeviceSurface::new(800, 600))
        .expect("transform");
    let y = transform.price_to_y(price);
    assert!(y > 0.0 && y < 600.0);
}
