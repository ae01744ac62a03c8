use anyhow::Result;
use std::io;
use std::path::PathBuf;

use photocap::app::App;
use photocap::config::{Config, SourceKind};
use photocap::logging;
use photocap::metadata::{self, ExiftoolSource};
use photocap::session::Session;

#[derive(Default)]
struct Args {
    config_path: Option<PathBuf>,
    folder: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("photocap {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    parsed.config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--folder" | "-f" => {
                if i + 1 < args.len() {
                    parsed.folder = Some(args[i + 1].clone());
                    i += 1;
                } else {
                    eprintln!("Error: --folder requires a path argument");
                    std::process::exit(1);
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn print_help() {
    println!(
        r#"photocap - caption, rename and catalogue site photos

USAGE:
    photocap [OPTIONS]

OPTIONS:
    --config, -c PATH   Path to config file
    --folder, -f PATH   Load this photos folder on start
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    PHOTOCAP_CONFIG     Path to config file (overrides default location)
    PHOTOCAP_LOG        Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/photocap/config.toml"#
    );
}

fn main() -> Result<()> {
    let args = parse_args();

    // Initialize logging (uses journald on Linux, file fallback otherwise)
    let _ = logging::init(None);

    let config_path = args.config_path.unwrap_or_else(Config::config_path);
    let config = Config::load_from(&config_path)?;

    if config.metadata.source == SourceKind::Exiftool {
        let exiftool = ExiftoolSource::new(
            config.metadata.exiftool.clone(),
            config.metadata.keep_backups,
        );
        if !exiftool.is_available() {
            eprintln!(
                "ExifTool was not found at {:?}. Install it from https://exiftool.org \
                 or set metadata.source = \"embedded\" in {}",
                config.metadata.exiftool,
                config_path.display()
            );
            std::process::exit(1);
        }
    }

    let source = metadata::source_for(&config.metadata);
    let session = Session::new(config, source);

    let stdin = io::stdin();
    let mut app = App::new(session, config_path, stdin.lock(), io::stdout());
    if let Some(folder) = args.folder {
        app.preload(&folder)?;
    }
    app.run()
}
