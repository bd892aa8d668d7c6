use std::io;
use std::path::{Path, PathBuf};
use std::process::exit;

use certprobe::config::{Config, Mode};
use clap::Parser;

const DEFAULT_CONFIG_FILE: &str = "certprobe.toml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The endpoint to check, e.g. https://www.mywebsite.org or tcp://localhost:3306.
    /// Can be given multiple times.
    #[arg(short = 'e', long = "endpoint", value_name = "URL")]
    endpoints: Vec<String>,

    /// TLS connection timeout in seconds [default: 30]
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Use the interactive terminal view instead of printing JSON
    #[arg(long)]
    tui: bool,

    /// Configuration file [default: certprobe.toml when present]
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print an example configuration file and exit
    #[arg(long)]
    generate_config: bool,

    /// Log filter, e.g. warn or certprobe=debug; RUST_LOG takes precedence [default: warn]
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() {
    let args = Args::parse();

    if args.generate_config {
        println!("{}", Config::example_toml());
        return;
    }

    let file_config = match load_config_file(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            exit(1);
        }
    };

    let settings = match Config::defaults()
        .merge_with(file_config)
        .merge_with(Config::from_cli_args(
            args.endpoints,
            args.timeout,
            args.tui,
            args.log_level,
        ))
        .into_settings()
    {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };

    certprobe::logging::init(&settings.log_level);
    tracing::debug!(?settings, "configuration resolved");

    let result = match settings.mode {
        Mode::Oneshot => {
            certprobe::run_oneshot(&settings.endpoints, settings.timeout, &mut io::stdout().lock())
        }
        Mode::Interactive => certprobe::tui::launch(settings.endpoints, settings.timeout),
    };

    if let Err(e) = result {
        eprintln!("Error running program: {}", e);
        exit(1);
    }
}

/// An explicit path must exist; the default file is optional.
fn load_config_file(path: Option<&Path>) -> Result<Config, certprobe::config::ConfigError> {
    match path {
        Some(path) => Config::from_file(path),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Config::from_file(DEFAULT_CONFIG_FILE),
        None => Ok(Config::default()),
    }
}
