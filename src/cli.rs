use crate::client::EcbClient;
use crate::config::TapConfig;
use crate::constants::TAP_NAME;
use crate::errors::AppResult;
use crate::singer::{about_info, AboutFormat, Catalog, SingerWriter, State};
use crate::tap::Tap;
use chrono::Utc;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

/// Builds the command line following the Singer tap conventions.
pub fn build_command() -> Command<'static> {
    Command::new(TAP_NAME)
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .after_help("Example:\n  tap-ecbexchangerates --config config.json --state state.json > output.jsonl")
        .arg(
            Arg::new("config")
                .long("config")
                .help("Configuration file (JSON, or TOML with a .toml extension); repeat to merge several")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("state")
                .long("state")
                .help("State file holding the bookmarks of a previous sync")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("catalog")
                .long("catalog")
                .alias("properties")
                .help("Catalog file selecting streams and properties")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("discover")
                .long("discover")
                .help("Print the catalog of available streams and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("about")
                .long("about")
                .help("Print the tap description, capabilities and settings and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .help("Output format of --about")
                .value_parser(["json", "markdown"])
                .default_value("json")
                .action(ArgAction::Set),
        )
}

/// Parses command-line arguments and executes the requested mode.
///
/// - `--about`: describe the tap (no configuration needed)
/// - `--discover`: print the catalog
/// - otherwise: sync the selected streams, writing Singer messages to stdout
///
/// # Returns
///
/// Returns an error if:
/// - No configuration file is given for discovery or sync
/// - Configuration, state or catalog files are invalid
/// - Network requests fail after retries
/// - Responses cannot be parsed
pub async fn cli() -> AppResult<()> {
    let matches = build_command().get_matches();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&matches, &mut out).await
}

/// Executes the mode selected by `matches`, writing protocol output to `out`.
pub async fn run<W: Write>(matches: &ArgMatches, out: &mut W) -> AppResult<()> {
    if flag(matches, "about") {
        let format = matches
            .get_one::<String>("format")
            .map(|s| s.as_str())
            .unwrap_or("json");
        writeln!(out, "{}", about_info(AboutFormat::try_from(format)?)?)?;
        return Ok(());
    }

    let config_paths: Vec<PathBuf> = matches
        .get_many::<PathBuf>("config")
        .map(|paths| paths.cloned().collect())
        .unwrap_or_default();
    let config = TapConfig::from_files(&config_paths)?;

    if flag(matches, "discover") {
        info!("Running discovery");
        writeln!(out, "{}", serde_json::to_string_pretty(&Tap::discover())?)?;
        return Ok(());
    }

    let state = match matches.get_one::<PathBuf>("state") {
        Some(path) => State::from_file(path)?,
        None => State::default(),
    };
    let catalog = matches
        .get_one::<PathBuf>("catalog")
        .map(|path| Catalog::from_file(path))
        .transpose()?;

    info!(
        currencies = %config.currencies.join(","),
        start_date = ?config.start_date,
        end_date = ?config.end_date,
        "Starting sync"
    );

    let client = EcbClient::new(&config)?;
    let mut tap = Tap::new(config, state, catalog);
    let mut writer = SingerWriter::new(out);
    tap.sync(&client, &mut writer, Utc::now().date_naive())
        .await
}

fn flag(matches: &ArgMatches, id: &str) -> bool {
    matches.get_one::<bool>(id).copied().unwrap_or(false)
}
