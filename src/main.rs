use anyhow::{Context, Result};
use clap::Parser;
use hsgf_rust::config::Config;
use hsgf_rust::error::Error;
use hsgf_rust::events::NullPresenter;
use hsgf_rust::{load_record, write_game, GameSlot, Snapshot};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::io::{self, Read};
use std::path::PathBuf;

/// Load a Hex game record and print its move tree.
#[derive(Parser, Debug)]
#[command(name = "hsgf", version)]
struct Cli {
    /// Record to read; stdin when omitted.
    file: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Board size, overriding the configuration.
    #[arg(long)]
    size: Option<u8>,

    /// Reject records that contain variations.
    #[arg(long)]
    no_variations: bool,

    /// Print the normalized record instead of the move tree.
    #[arg(long)]
    write: bool,

    /// Pretty-print the move tree JSON.
    #[arg(long)]
    pretty: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hsgf=info,hsgf_rust=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        match err.downcast_ref::<Error>() {
            Some(cause) => eprintln!("error[{}]: {:#}", cause.code(), err),
            None => eprintln!("error: {:#}", err),
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            Config::from_json(&text)
                .with_context(|| format!("bad configuration in {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(size) = cli.size {
        config = config.with_board_size(size);
    }
    if cli.no_variations {
        config = config.with_variations(false);
    }

    let input = match &cli.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?,
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("cannot read stdin")?;
            input
        }
    };

    let mut slot = GameSlot::new();
    let game = slot
        .create(config.clone())?
        .context("game already created")?;
    load_record(game, &input, &config, &mut NullPresenter)?;

    if cli.write {
        println!("{}", write_game(game)?);
    } else if cli.pretty {
        println!("{}", Snapshot::of(game).to_json_pretty());
    } else {
        println!("{}", Snapshot::of(game).to_json());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cli(file: PathBuf) -> Cli {
        Cli {
            file: Some(file),
            config: None,
            size: None,
            no_variations: false,
            write: true,
            pretty: false,
        }
    }

    #[test]
    fn unreadable_record_names_the_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.hsgf");
        let err = run(&cli(path.clone())).unwrap_err();
        let message = format!("{:#}", err);
        assert!(
            message.starts_with(&format!("cannot read {}", path.display())),
            "{}",
            message
        );
        assert!(err.downcast_ref::<Error>().is_none());
    }

    #[test]
    fn rejected_record_keeps_its_code() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("game.hsgf");
        std::fs::write(&path, "(;FF[4]SZ[12];W[aa])").unwrap();
        let err = run(&cli(path)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>().map(Error::code),
            Some("invalid-game-format")
        );
    }

    #[test]
    fn bad_configuration_file_is_reported_with_context() {
        let dir = tempdir().unwrap();
        let record = dir.path().join("game.hsgf");
        std::fs::write(&record, "(;FF[4]SZ[13];W[aa])").unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(&config, r#"{"boardSize": 40}"#).unwrap();

        let mut args = cli(record);
        args.config = Some(config.clone());
        let err = run(&args).unwrap_err();
        assert!(format!("{:#}", err).starts_with(&format!("bad configuration in {}", config.display())));
        assert_eq!(
            err.downcast_ref::<Error>().map(Error::code),
            Some("invalid-configuration")
        );
    }

    #[test]
    fn oversized_board_is_refused_before_loading() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("game.hsgf");
        std::fs::write(&path, "(;FF[4]SZ[30];W[aa])").unwrap();
        let mut args = cli(path);
        args.size = Some(30);
        let err = run(&args).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>().map(Error::code),
            Some("invalid-configuration")
        );
    }

    #[test]
    fn valid_record_runs_clean() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("game.hsgf");
        std::fs::write(&path, "(;FF[4]SZ[13];W[aa];B[swap])").unwrap();
        run(&cli(path)).unwrap();
    }
}
