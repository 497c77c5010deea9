use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use tradechart::core::{Candle, DeviceSurface, PriceSeries, Ticker, Viewport, ViewportConfig};
use tradechart::data::{MarketDataSource, SyntheticSource};
use tradechart::render::GeometryBuilder;

fn arbitrary_candle() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (1.0f64..1_000.0, 0.0f64..50.0, 0.0f64..1.0, 0.0f64..1.0).prop_map(
        |(low, span, open_factor, close_factor)| {
            let high = low + span;
            (low + open_factor * span, high, low, low + close_factor * span)
        },
    )
}

proptest! {
    #[test]
    fn accepted_candles_respect_ohlc_order(
        open in -1_000.0f64..1_000.0,
        high in -1_000.0f64..1_000.0,
        low in -1_000.0f64..1_000.0,
        close in -1_000.0f64..1_000.0
    ) {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).single().expect("time");
        if let Ok(candle) = Candle::new(time, open, high, low, close, 0.0) {
            prop_assert!(candle.low <= candle.open.min(candle.close));
            prop_assert!(candle.open.max(candle.close) <= candle.high);
        }
    }

    #[test]
    fn canonicalized_series_only_holds_valid_candles(
        rows in proptest::collection::vec((0i64..60, -10.0f64..10.0, -10.0f64..10.0, -10.0f64..10.0, -10.0f64..10.0), 0..80)
    ) {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).single().expect("time");
        let candles = rows
            .into_iter()
            .map(|(day, open, high, low, close)| Candle {
                time: start + Duration::days(day),
                open,
                high,
                low,
                close,
                volume: 1.0,
            })
            .collect();
        let series = PriceSeries::canonicalize(Ticker::new("RAW").expect("ticker"), candles);
        for candle in series.candles() {
            prop_assert!(candle.low <= candle.open.min(candle.close));
            prop_assert!(candle.open.max(candle.close) <= candle.high);
        }
        prop_assert!(series.candles().windows(2).all(|pair| pair[0].time < pair[1].time));
    }

    #[test]
    fn bodies_stay_inside_wicks_and_surface(
        quotes in proptest::collection::vec(arbitrary_candle(), 1..120),
        width in 50u32..3000,
        height in 50u32..2000
    ) {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).single().expect("time");
        let candles = quotes
            .iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| {
                Candle::new(start + Duration::days(i as i64), open, high, low, close, 1.0)
                    .expect("valid candle")
            })
            .collect();
        let series = PriceSeries::new(Ticker::new("GEOM").expect("ticker"), candles).expect("series");
        let mut viewport = Viewport::new(ViewportConfig::default());
        viewport.reset_for(&series);
        let buffers = GeometryBuilder::default().build(&series, &viewport, DeviceSurface::new(width, height));

        prop_assert_eq!(buffers.body_count, viewport.window().expect("window").width());
        buffers.validate().expect("valid buffers");
        for candle in &buffers.candles {
            prop_assert!(candle.body_left < candle.body_right);
            prop_assert!(candle.body_left <= candle.center_x && candle.center_x <= candle.body_right);
            prop_assert!(candle.center_x > 0.0 && candle.center_x < f64::from(width));
            prop_assert!(candle.wick_top <= candle.wick_bottom);
            prop_assert!(candle.wick_top >= -1e-6 && candle.wick_bottom <= f64::from(height) + 1e-6);
        }
    }

    #[test]
    fn build_is_deterministic_for_any_synthetic_series(
        seed in any::<u64>(),
        count in 0usize..300,
        width in 1u32..2000,
        height in 1u32..2000
    ) {
        let source = SyntheticSource::new(["SYNT"])
            .expect("source")
            .with_seed(seed)
            .with_candle_count(count);
        let ticker = Ticker::new("SYNT").expect("ticker");
        let series = PriceSeries::canonicalize(ticker.clone(), source.fetch(&ticker).expect("fetch"));
        let mut viewport = Viewport::new(ViewportConfig::default());
        viewport.reset_for(&series);
        let builder = GeometryBuilder::default();
        let surface = DeviceSurface::new(width, height);

        let a = builder.build(&series, &viewport, surface);
        let b = builder.build(&series, &viewport, surface);
        prop_assert_eq!(a.vertex_bytes(), b.vertex_bytes());
        prop_assert_eq!(a.line_index_bytes(), b.line_index_bytes());
        prop_assert_eq!(a.triangle_index_bytes(), b.triangle_index_bytes());
        prop_assert_eq!(a.is_empty(), count == 0);
    }
}
