use std::env::args;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use std::process::exit;

use gumdrop::Options;
use hera_led::{convert_with, Conversion, LedLayout};
use log::{debug, error, info, warn, LevelFilter};

use crate::cli_opts::CliStart;
use crate::config::Config;
use crate::error::{Error, Result};

mod cli_opts;
mod config;
mod error;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args: Vec<String> = args().skip(1).collect();

    let parsed = match CliStart::parse_args_default(&args) {
        Ok(p) => p,
        Err(err) => {
            println!("Error: {}", err);
            println!("\n{}", CliStart::usage());
            exit(Error::Usage.exit_code());
        }
    };

    if parsed.help {
        println!("{}", Error::Usage);
        println!("\n{}", CliStart::usage());
        return;
    }

    let mut logger = env_logger::Builder::new();
    logger
        .target(env_logger::Target::Stdout)
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .filter(
            None,
            if parsed.verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
        )
        .parse_default_env()
        .init();

    if parsed.version {
        println!("ledcsv v{}", VERSION);
        println!("hera-led v{}", hera_led::VERSION);
        return;
    }

    let config = Config::load().unwrap_or_else(|err| {
        warn!("Using default config: {err}");
        Config::default()
    });
    debug!("{config:?}");

    if let Err(err) = run(&parsed, &config) {
        eprintln!("{err}");
        if matches!(err, Error::Usage) {
            eprintln!("\n{}", CliStart::usage());
        }
        exit(err.exit_code());
    }
}

/// CLI flags take precedence over the config file
fn run(parsed: &CliStart, config: &Config) -> Result<()> {
    let layout = load_layout(parsed.layout.as_ref().or(config.layout_file.as_ref()))?;

    if let Some(path) = &parsed.dump_layout {
        let ron = layout.to_ron().map_err(Error::Layout)?;
        std::fs::write(path, ron).map_err(|e| Error::Output(path.clone(), e))?;
        info!("Wrote LED layout to {path}");
        return Ok(());
    }

    let (input, output) = parsed.input_output().ok_or(Error::Usage)?;
    let temp_file = if parsed.no_temp_file {
        None
    } else {
        parsed.temp_file.as_ref().or(config.temp_file.as_ref())
    };

    let file = File::open(input).map_err(|e| Error::Input(input.to_owned(), e))?;
    let conversion = convert_with(&mut BufReader::new(file), &layout)?;

    if let Some(temp) = temp_file {
        write_temp_file(&conversion, temp)?;
    }
    write_output(&conversion, output)
}

fn load_layout(path: Option<&String>) -> Result<LedLayout> {
    match path {
        Some(path) => {
            info!("Loading LED layout from {path}");
            LedLayout::from_file(Path::new(path)).map_err(Error::Layout)
        }
        None => LedLayout::hera().map_err(Error::Layout),
    }
}

fn write_temp_file(conversion: &Conversion, path: &str) -> Result<()> {
    std::fs::write(path, conversion.downscaled_bmp())
        .map_err(|e| Error::TempFile(path.to_owned(), e))?;
    debug!("Wrote scaled bitmap to {path}");
    Ok(())
}

/// Only called once the conversion succeeded. A failed write removes whatever
/// part of the file was created.
fn write_output(conversion: &Conversion, path: &str) -> Result<()> {
    let csv = conversion.csv();
    if let Err(e) = std::fs::write(path, csv) {
        if Path::new(path).exists() {
            std::fs::remove_file(path)
                .unwrap_or_else(|err| error!("Could not remove partial {path}: {err}"));
        }
        return Err(Error::Output(path.to_owned(), e));
    }
    info!("Wrote {} LED colours to {path}", conversion.leds().as_slice().len());
    Ok(())
}
