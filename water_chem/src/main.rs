use anyhow::{Context, bail};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use water_chem::assemble::ReportAssembler;
use water_chem::config::Config;
use water_chem::ingest::daily::HttpDailySource;
use water_chem::ingest::monthly::HttpReportSource;
use water_chem::logging::init_logging;
use water_chem::model::Derived;
use water_chem::output::{
    OutputFormat, render_json, render_line_protocol, render_monthly_table, render_text,
};
use water_chem::parameters::PARAMETER_SPECS;
use water_chem::resolver::MonthlyReportResolver;
use water_chem::verify::{render_verification, verify_sources};
use water_chem::zones::{Zone, all_zone_codes, default_zone, find_zone};

/// Exit code when assembly fails at the daily or monthly stage.
const EXIT_ASSEMBLY: u8 = 1;
/// Exit code for configuration and usage errors.
const EXIT_USAGE: u8 = 2;
/// Exit code under `--strict` when a derived value is unavailable.
const EXIT_INCOMPLETE: u8 = 3;

#[derive(Parser)]
#[command(
    name = "water_chem",
    version,
    about = "Calculate water chemistry from daily and monthly water quality reports"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Supply zone (defaults to WATER_CHEM_ZONE, the config file, then ELS)
    #[arg(short, long, global = true)]
    zone: Option<String>,

    /// Print the monthly parameter table before the report
    #[arg(long)]
    full: bool,

    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Config file (defaults to WATER_CHEM_CONFIG, then ./water_chem.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Exit non-zero if any derived value cannot be computed
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Check the daily page and every monthly report in the lookback window
    Sources {
        /// Print the check as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    init_logging(
        config.logging.level,
        config.logging.file.as_deref(),
        config.logging.timestamps,
    )
    .context("initialising logging")?;

    let zone = select_zone(cli.zone.as_deref().or(config.daily.zone.as_deref()))?;
    info!(stage = "system", zone = zone.code, plant = zone.name, "zone selected");
    let client = config.http_client().context("building HTTP client")?;
    let daily = HttpDailySource::new(client.clone(), config.daily.url_template.as_str());
    let monthly = HttpReportSource::new(client, config.report_locator());
    let today = Local::now().date_naive();

    if let Some(Command::Sources { json }) = cli.command {
        let report = verify_sources(
            &daily,
            &monthly,
            zone.code,
            &config.lookback_window(),
            today,
            PARAMETER_SPECS,
        );
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", render_verification(&report));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let resolver = MonthlyReportResolver::new(config.lookback_window(), today);
    let assembler = ReportAssembler::new(&daily, &monthly, resolver);

    let (mut report, extraction) = match assembler.assemble_detailed(zone.code) {
        Ok(assembled) => assembled,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(ExitCode::from(EXIT_ASSEMBLY));
        }
    };

    let overridden = config.apply_overrides(&mut report);
    if !overridden.is_empty() {
        let keys: Vec<&str> = overridden.iter().map(|f| f.key()).collect();
        info!(stage = "system", fields = %keys.join(", "), "applied configured overrides");
    }

    if cli.full {
        println!("{}", render_monthly_table(&extraction));
    }

    match cli.format {
        OutputFormat::Text => print!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", render_json(&report)?),
        OutputFormat::Line => {
            if let Some(line) = render_line_protocol(&report, Utc::now().timestamp_nanos_opt()) {
                println!("{}", line);
            }
        }
    }

    if cli.strict {
        let unavailable: Vec<String> = Derived::ALL
            .into_iter()
            .filter_map(|d| report.derived(d).err())
            .map(|e| e.to_string())
            .collect();
        if !unavailable.is_empty() {
            for reason in &unavailable {
                eprintln!("Error: {}", reason);
            }
            return Ok(ExitCode::from(EXIT_INCOMPLETE));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn select_zone(requested: Option<&str>) -> anyhow::Result<&'static Zone> {
    match requested {
        None => Ok(default_zone()),
        Some(code) => match find_zone(code) {
            Some(zone) => Ok(zone),
            None => bail!(
                "unknown zone '{}' (expected one of: {})",
                code,
                all_zone_codes().join(", ")
            ),
        },
    }
}
