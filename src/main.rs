use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::json;

use turtle_risk_service::api;
use turtle_risk_service::config::{MessagingCredentials, ServiceConfig};
use turtle_risk_service::logging::{self, DataSource};
use turtle_risk_service::model::Coordinate;
use turtle_risk_service::verify;
use turtle_risk_service::RiskAssessor;

#[derive(Parser, Debug)]
#[command(name = "turtle-risk", about = "Sea-turtle collision risk assessment")]
struct Cli {
    /// TOML configuration file. Defaults to ./turtle_risk.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assess one location and print the JSON response.
    Assess(AssessArgs),
    /// Probe ERDDAP, the model file and messaging configuration.
    Verify(VerifyArgs),
}

#[derive(ClapArgs, Debug)]
struct AssessArgs {
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,
    /// Sea-surface temperature observed on site, °C.
    #[arg(long, allow_negative_numbers = true)]
    sst: Option<f64>,
    /// Phone number to text the result to.
    #[arg(long)]
    contact: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct VerifyArgs {
    #[arg(long, allow_negative_numbers = true, default_value_t = verify::DEFAULT_PROBE_LATITUDE)]
    lat: f64,
    #[arg(long, allow_negative_numbers = true, default_value_t = verify::DEFAULT_PROBE_LONGITUDE)]
    lon: f64,
    /// Emit the report as JSON instead of the summary table.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ServiceConfig::load_with_env(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    // validate() already checked the level parses
    let level = config.logging.min_level().unwrap_or(logging::LogLevel::Info);
    logging::init_logger(level, config.logging.file.as_deref(), config.logging.timestamps);

    let credentials = MessagingCredentials::from_env();

    match cli.command {
        Command::Assess(args) => run_assess(&config, credentials, args),
        Command::Verify(args) => run_verify(&config, &credentials, args),
    }
}

fn run_assess(config: &ServiceConfig, credentials: MessagingCredentials, args: AssessArgs) -> ExitCode {
    let assessor = match RiskAssessor::from_config(config, credentials) {
        Ok(assessor) => assessor,
        Err(e) => {
            logging::error(DataSource::System, None, &format!("Failed to start: {}", e));
            return ExitCode::FAILURE;
        }
    };

    let payload = json!({
        "latitude": args.lat,
        "longitude": args.lon,
        "sst": args.sst,
        "contact": args.contact,
    });

    let (response, alert) = api::handle_assess(&assessor, &payload);

    match serde_json::to_string_pretty(&response.body) {
        Ok(body) => println!("{}", body),
        Err(e) => eprintln!("Failed to render response: {}", e),
    }

    // A one-shot process would kill the sender on exit; let it finish.
    if let Some(task) = alert {
        task.wait();
    }

    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(if response.status >= 500 { 2 } else { 1 })
    }
}

fn run_verify(config: &ServiceConfig, credentials: &MessagingCredentials, args: VerifyArgs) -> ExitCode {
    let probe = match Coordinate::new(args.lat, args.lon) {
        Ok(probe) => probe,
        Err(e) => {
            eprintln!("Invalid probe coordinate: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let report = match verify::run_full_verification(config, credentials, probe) {
        Ok(report) => report,
        Err(e) => {
            logging::error(DataSource::System, None, &format!("Verification failed: {}", e));
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to render report: {}", e),
        }
    } else {
        verify::print_summary(&report);
    }

    if report.summary.failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
