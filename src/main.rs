use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use battery_dispatch::{config, domain, optimizer, records, telemetry};
use clap::Parser;
use config::Config;
use domain::{BatteryParameters, DispatchSchedule};
use futures::future::try_join_all;
use optimizer::{block_on_detached, DispatchOptimizer, GoodLpSolver};
use telemetry::init_tracing;
use tracing::info;

#[derive(Parser)]
#[command(name = "battery-dispatch")]
#[command(about = "Optimal battery charge/discharge schedule for hourly price curves", long_about = None)]
struct Cli {
    /// CSV files with `Hour` and `Price (GBP/MWh)` columns, each optimised independently
    #[arg(required = true)]
    prices: Vec<PathBuf>,

    /// Configuration file (defaults to config/default.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write `<name>_dispatch.csv` files here instead of printing to stdout
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

async fn optimize_file(
    optimizer: &DispatchOptimizer,
    path: &Path,
    battery: &BatteryParameters,
) -> Result<DispatchSchedule> {
    let prices = records::read_prices_file(path)?;
    info!(
        file = %path.display(),
        hours = prices.len(),
        average_price = prices.average_price(),
        "loaded price curve"
    );
    optimizer
        .optimize(&prices, battery)
        .await
        .with_context(|| format!("optimising {}", path.display()))
}

fn output_path(dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "prices".to_string());
    dir.join(format!("{stem}_dispatch.csv"))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = Config::load(cli.config.as_deref())?;
    init_tracing(&cfg.logging);
    info!(
        battery = %cfg.battery,
        max_daily_cycles = cfg.battery.max_daily_cycles(),
        "loaded configuration"
    );

    block_on_detached(run(cli, cfg)).context("starting tokio runtime")?
}

async fn run(cli: Cli, cfg: Config) -> Result<()> {
    let optimizer = DispatchOptimizer::new(Arc::new(GoodLpSolver::new()), cfg.solver.time_limit());
    info!(
        time_limit_s = optimizer.time_limit().as_secs_f64(),
        files = cli.prices.len(),
        "optimising price curves"
    );

    let jobs = cli
        .prices
        .iter()
        .map(|path| optimize_file(&optimizer, path, &cfg.battery));
    let schedules = try_join_all(jobs).await?;

    if let Some(dir) = &cli.output_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    for (input, schedule) in cli.prices.iter().zip(&schedules) {
        match &cli.output_dir {
            Some(dir) => {
                let path = output_path(dir, input);
                records::write_schedule_file(&path, schedule)?;
                info!(file = %path.display(), "wrote dispatch schedule");
            }
            None => records::write_schedule(std::io::stdout().lock(), schedule)?,
        }

        info!(
            file = %input.display(),
            profit = schedule.profit,
            cycles = schedule.equivalent_full_cycles(),
            "done"
        );
    }

    Ok(())
}
