use std::fs;
use std::path::PathBuf;

use tradechart::core::{DeviceSurface, ShiftDirection, Ticker};
use tradechart::data::{MarketDataSource, SyntheticSource};
use tradechart::render::NullRenderer;
use tradechart::{ChartEngine, ChartEngineConfig, SeriesStatus};

const DEFAULT_UNIVERSE: [&str; 13] = [
    "GAZP", "NVTK", "ROSN", "LKOH", "TATN", "TATNP", "SIBN", "IRAO", "PHOR", "NLMK", "MAGN",
    "GMKN", "RUAL",
];

#[derive(Debug)]
struct CliArgs {
    tickers: Vec<String>,
    shift: i64,
    surface: Option<DeviceSurface>,
    config_path: Option<PathBuf>,
    moex_from: Option<String>,
}

fn main() {
    let _ = tradechart::telemetry::init_default_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = parse_args()?;
    let config = match &args.config_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|err| format!("failed to read `{}`: {err}", path.display()))?;
            ChartEngineConfig::from_json_str(&raw).map_err(|err| err.to_string())?
        }
        None => ChartEngineConfig::default(),
    };

    match &args.moex_from {
        Some(from) => run_moex(from, config, &args),
        None => {
            let source = SyntheticSource::new(DEFAULT_UNIVERSE).map_err(|err| err.to_string())?;
            run_with(source, config, &args)
        }
    }
}

#[cfg(feature = "moex-source")]
fn run_moex(from: &str, config: ChartEngineConfig, args: &CliArgs) -> Result<(), String> {
    let from = chrono::NaiveDate::parse_from_str(from, "%Y-%m-%d")
        .map_err(|err| format!("invalid --moex date `{from}`: {err}"))?;
    let source = tradechart::data::MoexSource::new(from).map_err(|err| err.to_string())?;
    run_with(source, config, args)
}

#[cfg(not(feature = "moex-source"))]
fn run_moex(_from: &str, _config: ChartEngineConfig, _args: &CliArgs) -> Result<(), String> {
    Err("--moex requires the `moex-source` feature".to_owned())
}

fn run_with<S: MarketDataSource>(
    source: S,
    config: ChartEngineConfig,
    args: &CliArgs,
) -> Result<(), String> {
    let mut engine =
        ChartEngine::new(NullRenderer::new(), source, config).map_err(|err| err.to_string())?;

    for symbol in &args.tickers {
        let ticker = Ticker::new(symbol.as_str()).map_err(|err| err.to_string())?;
        if let SeriesStatus::Unavailable { reason } =
            engine.display(ticker).map_err(|err| err.to_string())?
        {
            eprintln!("warning: {symbol}: {reason}");
        }
    }

    let direction = ShiftDirection::from(args.shift > 0);
    for _ in 0..args.shift.unsigned_abs() {
        if !engine.shift(direction).map_err(|err| err.to_string())? {
            break;
        }
    }

    if let Some(surface) = args.surface {
        engine.set_surface(surface).map_err(|err| err.to_string())?;
        engine.draw().map_err(|err| err.to_string())?;
    }

    let json = engine
        .snapshot()
        .to_json_pretty()
        .map_err(|err| err.to_string())?;
    println!("{json}");
    Ok(())
}

fn parse_args() -> Result<CliArgs, String> {
    let mut tickers = Vec::new();
    let mut shift = 0_i64;
    let mut surface = None;
    let mut config_path = None;
    let mut moex_from = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--ticker" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --ticker".to_owned())?;
                tickers.push(value);
            }
            "--shift" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --shift".to_owned())?;
                shift = value
                    .parse()
                    .map_err(|err| format!("invalid --shift `{value}`: {err}"))?;
            }
            "--size" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --size".to_owned())?;
                surface = Some(parse_size(&value)?);
            }
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --config".to_owned())?;
                config_path = Some(PathBuf::from(value));
            }
            "--moex" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --moex".to_owned())?;
                moex_from = Some(value);
            }
            "-h" | "--help" => {
                println!(
                    "Usage: cargo run --bin chart_snapshot -- [--ticker <symbol>]... [--shift <+/-candles>] [--size <width>x<height>] [--config <path>] [--moex <YYYY-MM-DD>]"
                );
                std::process::exit(0);
            }
            _ => {
                return Err(format!("unknown argument `{arg}`"));
            }
        }
    }
    if tickers.is_empty() {
        tickers.push(DEFAULT_UNIVERSE[0].to_owned());
    }

    Ok(CliArgs {
        tickers,
        shift,
        surface,
        config_path,
        moex_from,
    })
}

fn parse_size(value: &str) -> Result<DeviceSurface, String> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| format!("size `{value}` must look like 1280x720"))?;
    let width = width
        .parse()
        .map_err(|err| format!("invalid width `{width}`: {err}"))?;
    let height = height
        .parse()
        .map_err(|err| format!("invalid height `{height}`: {err}"))?;
    Ok(DeviceSurface::new(width, height))
}
