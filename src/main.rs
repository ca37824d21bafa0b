mod cache;
mod config;
mod dashboard;
mod error;
mod fetcher;
mod models;
mod provider;
mod render;
mod reshape;
mod session;
mod utils;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppConfig;
use crate::dashboard::{title_line, Controls, Dashboard, Outcome};
use crate::fetcher::PriceFetcher;
use crate::models::TickerMap;
use crate::provider::YahooChartSource;
use crate::render::{write_view, OutputFormat};
use crate::session::{split_companies, Session};

#[derive(Parser)]
#[command(name = "kabuka", about = "Closing-price dashboard for Japanese companies", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch prices and print the selected companies
    Show {
        /// Lookback window in days, clamped to 1-50 (default from config: 20)
        #[arg(short, long, allow_negative_numbers = true)]
        days: Option<i64>,

        /// Comma-separated company names (default from config: トヨタ)
        #[arg(short, long)]
        companies: Option<String>,

        /// Y-axis minimum, clamped to 0-14999.9
        #[arg(long, allow_negative_numbers = true)]
        ymin: Option<f64>,

        /// Y-axis maximum, clamped to 0-15000
        #[arg(long, allow_negative_numbers = true)]
        ymax: Option<f64>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// List the available companies and their ticker symbols
    Companies,

    /// Interactive session; re-renders on every control change
    Interactive {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(log_filter(cli.verbose)))
        .init();

    let config = AppConfig::load()?;
    let tickers = TickerMap::builtin();

    let defaults = Controls {
        days: config.dashboard.default_days as i64,
        companies: config.dashboard.default_companies.clone(),
        ymin: config.dashboard.ymin,
        ymax: config.dashboard.ymax,
    };

    match cli.command {
        Command::Companies => {
            println!("{} companies:", tickers.len());
            for (name, symbol) in tickers.iter() {
                println!("  {}  {}", symbol, name);
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Show { days, companies, ymin, ymax, format } => {
            let controls = Controls {
                days: days.unwrap_or(defaults.days),
                companies: companies
                    .as_deref()
                    .map(split_companies)
                    .unwrap_or(defaults.companies),
                ymin: ymin.unwrap_or(defaults.ymin),
                ymax: ymax.unwrap_or(defaults.ymax),
            };

            let mut dashboard = Dashboard::new(build_fetcher(&config)?, tickers);
            let outcome = dashboard.render(&controls).await;

            match outcome {
                Outcome::Rendered(view) => {
                    let stdout = std::io::stdout();
                    let mut out = stdout.lock();
                    if format == OutputFormat::Table {
                        writeln!(out, "{}", title_line(Local::now().date_naive()))?;
                    }
                    write_view(&view, format, &mut out)?;
                    info!("{} chart rows", view.chart_rows.len());
                    Ok(ExitCode::SUCCESS)
                }
                other => {
                    if let Some(msg) = other.message() {
                        eprintln!("{}", msg);
                    }
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Command::Interactive { format } => {
            let dashboard = Dashboard::new(build_fetcher(&config)?, tickers);
            let mut session = Session::new(dashboard, defaults, format);

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            writeln!(out, "{}", title_line(Local::now().date_naive()))?;

            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            session.run(stdin, &mut out).await?;
            debug!("Session ended with selection {:?}", session.controls().companies);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Filter directives for `-v` count. Event targets are prefixed with this
/// binary's crate name, not the package name.
fn log_filter(verbose: u8) -> String {
    let krate = env!("CARGO_CRATE_NAME");
    match verbose {
        0 => format!("{}=warn", krate),
        1 => format!("{}=info,warn", krate),
        2 => format!("{}=debug,info", krate),
        _ => "trace".to_string(),
    }
}

fn build_fetcher(config: &AppConfig) -> Result<PriceFetcher> {
    let source = YahooChartSource::new(&config.provider)?;
    Ok(PriceFetcher::new(Arc::new(source), &config.fetch))
}
