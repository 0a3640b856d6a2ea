//! Dashboard CLI
//!
//! Command-line interface for dashboard operations:
//! - Prepare the dataset offline and summarize it
//! - Inspect Rt and snapshot rows
//! - Check or refresh a running server
//! - Generate a config file

use anyhow::Context;
use clap::{Parser, Subcommand};
use covid_dashboard::config::{generate_default_config, Config};
use covid_dashboard::prepare::{is_excluded, Dataset};
use covid_dashboard::render::RiskLevel;
use covid_dashboard::service::DashboardService;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "covid-dashboard-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "COVID-19 France dashboard tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: standard locations, then environment)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Server URL for status and refresh
    #[arg(long, default_value = "http://localhost:80", global = true)]
    pub api_url: String,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the data, prepare the dataset and print a summary
    Prepare,

    /// Show Rt per department
    Rt {
        /// Department code; prints its full series
        #[arg(short, long)]
        region: Option<String>,
        /// Number of trailing days for a series
        #[arg(short, long, default_value = "28")]
        last: usize,
    },

    /// Show snapshot rows with their risk level
    Snapshot,

    /// Show server status
    Status,

    /// Ask the server to reload its data
    Refresh {
        /// Rebuild even when the data did not change
        #[arg(long)]
        force: bool,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "covid_dashboard=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Prepare => {
            let dataset = load_dataset(&cli).await?;
            print_summary(&dataset, &cli.format)?;
        }

        Commands::Rt { region, last } => {
            let dataset = load_dataset(&cli).await?;
            match region {
                Some(code) => print_rt_series(&dataset, code, *last, &cli.format)?,
                None => print_latest_rt(&dataset, &cli.format)?,
            }
        }

        Commands::Snapshot => {
            let dataset = load_dataset(&cli).await?;
            print_snapshot(&dataset, &cli.format)?;
        }

        Commands::Status => {
            let client = reqwest::Client::new();
            let response = client.get(format!("{}/health", cli.api_url)).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: serde_json::Value = resp.json().await?;

                    println!("covid-dashboard v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!(
                        "Status: {}",
                        health["status"].as_str().unwrap_or("unknown")
                    );
                    println!(
                        "Data until: {}",
                        health["data_date"].as_str().unwrap_or("-")
                    );
                    println!(
                        "Prepared at: {}",
                        health["prepared_at"].as_str().unwrap_or("-")
                    );
                    if let Some(regions) = health["regions"].as_u64() {
                        println!("Departments: {}", regions);
                    }
                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!();
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => {
                    eprintln!("Server returned error: {}", resp.status());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Cannot connect to the dashboard at {}", cli.api_url);
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Refresh { force } => {
            let client = reqwest::Client::new();
            let response = client
                .post(format!("{}/api/v1/refresh?force={}", cli.api_url, force))
                .send()
                .await?;

            let status = response.status();
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            if status.is_success() {
                println!(
                    "{} (data until {}, {} ms)",
                    body["status"].as_str().unwrap_or("-"),
                    body["data_date"].as_str().unwrap_or("-"),
                    body["duration_ms"].as_u64().unwrap_or(0)
                );
            } else {
                eprintln!(
                    "Refresh failed ({}): {}",
                    status,
                    body["error"]["message"].as_str().unwrap_or("unknown error")
                );
                std::process::exit(1);
            }
        }

        Commands::Config { output } => {
            let config = generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

async fn load_dataset(cli: &Cli) -> anyhow::Result<std::sync::Arc<Dataset>> {
    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    let service = DashboardService::from_config(&config)
        .await
        .with_context(|| format!("preparing data from {}", config.data.dir))?;
    Ok(service.current().await)
}

fn format_value(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "-".to_string())
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

fn print_summary(dataset: &Dataset, format: &str) -> anyhow::Result<()> {
    let plot = &dataset.national_plot;
    if format == "json" {
        let summary = serde_json::json!({
            "data_date": dataset.data_date,
            "departments": dataset.snapshot.len(),
            "days": dataset.regional.days(),
            "national_days": dataset.national.len(),
            "model_date": plot.model_date,
            "last_predicted_date": plot.last_predicted_date(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Data until:          {}", dataset.data_date);
    println!("Departments:         {}", dataset.snapshot.len());
    println!("Days:                {}", dataset.regional.days());
    println!("National days:       {}", dataset.national.len());
    println!("Model trained until: {}", plot.model_date);
    println!("Predictions until:   {}", plot.last_predicted_date());
    Ok(())
}

fn print_latest_rt(dataset: &Dataset, format: &str) -> anyhow::Result<()> {
    let rows: Vec<(&str, &str, Option<f64>)> = dataset
        .rt
        .iter()
        .filter(|(code, _)| !is_excluded(code))
        .map(|(code, series)| {
            (
                code,
                dataset.names.name(code).unwrap_or("-"),
                series.last(),
            )
        })
        .collect();

    match format {
        "json" => {
            let json: Vec<_> = rows
                .iter()
                .map(|(code, name, rt)| serde_json::json!({ "code": code, "name": name, "rt": rt }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        "csv" => {
            println!("code,name,rt");
            for (code, name, rt) in rows {
                println!("{},{},{}", code, name, rt.map(|v| v.to_string()).unwrap_or_default());
            }
        }
        _ => {
            println!("Rt on {}", dataset.data_date);
            println!("{:<6} {:<28} {}", "Code", "Name", "Rt");
            println!("{}", "-".repeat(42));
            for (code, name, rt) in rows {
                println!("{:<6} {:<28} {}", code, name, format_value(rt, 2));
            }
        }
    }
    Ok(())
}

fn print_rt_series(dataset: &Dataset, code: &str, last: usize, format: &str) -> anyhow::Result<()> {
    let series = dataset
        .rt
        .get(code)
        .with_context(|| format!("unknown department code {}", code))?;
    let points: Vec<_> = series.iter().collect();
    let tail = &points[points.len().saturating_sub(last)..];

    match format {
        "json" => {
            let json: Vec<_> = tail
                .iter()
                .map(|(date, rt)| serde_json::json!({ "date": date, "rt": rt }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        "csv" => {
            println!("date,rt");
            for (date, rt) in tail {
                println!("{},{}", date, rt.map(|v| v.to_string()).unwrap_or_default());
            }
        }
        _ => {
            println!("Rt for {} ({})", dataset.names.name(code).unwrap_or(code), code);
            println!("{:<12} {}", "Date", "Rt");
            println!("{}", "-".repeat(20));
            for (date, rt) in tail {
                println!("{:<12} {}", date.to_string(), format_value(*rt, 3));
            }
        }
    }
    Ok(())
}

fn print_snapshot(dataset: &Dataset, format: &str) -> anyhow::Result<()> {
    let snapshot = &dataset.snapshot;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(snapshot)?),
        "csv" => {
            println!("code,name,positive,tested,positive_previous,rt,risk");
            for row in &snapshot.rows {
                println!(
                    "{},{},{},{},{},{},{:?}",
                    row.code,
                    row.name,
                    row.positive,
                    row.tested,
                    row.positive_previous,
                    row.rt.map(|v| v.to_string()).unwrap_or_default(),
                    RiskLevel::classify(row.rt, row.positive)
                );
            }
        }
        _ => {
            println!(
                "{}-day window {} to {}",
                snapshot.window_days, snapshot.start, snapshot.end
            );
            println!(
                "{:<6} {:<24} {:>10} {:>10} {:>8} {}",
                "Code", "Name", "Positive", "Tested", "Rt", "Risk"
            );
            println!("{}", "-".repeat(68));
            for row in &snapshot.rows {
                println!(
                    "{:<6} {:<24} {:>10.0} {:>10.0} {:>8} {:?}",
                    row.code,
                    row.name,
                    row.positive,
                    row.tested,
                    format_value(row.rt, 2),
                    RiskLevel::classify(row.rt, row.positive)
                );
            }
        }
    }
    Ok(())
}
