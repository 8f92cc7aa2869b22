use chrono::NaiveDate;
use inclusion_engine::{ForecastEngine, normalize_horizon};
use inclusion_runner::{
    ForecastRunner, RunnerConfig, default_horizon, load_config, load_records, logging,
    write_report,
};
use std::path::PathBuf;

fn print_help() {
    eprintln!(
        r#"Inclusion Forecast - event-augmented indicator forecasts

USAGE:
    inclusion-forecast --records <PATH> [OPTIONS]

OPTIONS:
    --records <PATH>      JSON export of observations, events and impact links
    --config <PATH>       Engine configuration (JSON); defaults when omitted
    --indicator <NAME>    Forecast only this indicator (repeatable)
    --years <N>           Yearly horizon after the latest observation (default: 3)
    --date <YYYY-MM-DD>   Explicit target date (repeatable, overrides --years)
    --parallel <N>        Maximum concurrent scenario tasks
    --output <PATH>       Write the report here instead of stdout
    --help                Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG              Log level filter (default: info)

EXAMPLES:
    inclusion-forecast --records data/records.json
    inclusion-forecast --records data/records.json --config engine.json \
        --indicator account_ownership --years 5 --output forecast.json
"#
    );
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let mut records_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut indicators: Vec<String> = Vec::new();
    let mut dates: Vec<NaiveDate> = Vec::new();
    let mut years: u32 = 3;
    let mut runner_config = RunnerConfig::default();

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || {
            i += 1;
            args.get(i)
                .cloned()
                .unwrap_or_else(|| fail(&format!("{} requires a value", flag)))
        };
        match flag {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--records" | "-r" => records_path = Some(PathBuf::from(value())),
            "--config" | "-c" => config_path = Some(PathBuf::from(value())),
            "--output" | "-o" => output_path = Some(PathBuf::from(value())),
            "--indicator" | "-i" => indicators.push(value()),
            "--years" => {
                let raw = value();
                years = raw
                    .parse()
                    .unwrap_or_else(|_| fail(&format!("invalid --years '{}'", raw)));
            }
            "--date" => {
                let raw = value();
                dates.push(
                    parse_date(&raw).unwrap_or_else(|| fail(&format!("invalid --date '{}'", raw))),
                );
            }
            "--parallel" => {
                let raw = value();
                runner_config.max_parallel = raw
                    .parse()
                    .unwrap_or_else(|_| fail(&format!("invalid --parallel '{}'", raw)));
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(records_path) = records_path else {
        print_help();
        fail("--records is required");
    };

    // Configuration errors abort before any computation
    let config = load_config(config_path.as_deref())?;
    let engine = ForecastEngine::new(config)?;
    let raw = load_records(&records_path)?;

    let runner = ForecastRunner::new(engine, runner_config);
    let normalized = runner.engine().normalize(&raw);
    let horizon = if dates.is_empty() {
        default_horizon(&normalized.dataset, years)
    } else {
        normalize_horizon(&dates)
    };
    log::info!(
        "Horizon: {} dates ({} .. {})",
        horizon.len(),
        horizon.first().map(|d| d.to_string()).unwrap_or_default(),
        horizon.last().map(|d| d.to_string()).unwrap_or_default()
    );

    let selection = (!indicators.is_empty()).then_some(indicators.as_slice());
    let report = runner.run_normalized(normalized, selection, &horizon).await;

    for (key, error) in &report.failures {
        log::warn!("{}: {}", key, error);
    }

    if let Some(json) = write_report(&report, output_path.as_deref())? {
        println!("{}", json);
    }

    Ok(())
}
