//! Command-line front end for avatar creation and lip-sync synthesis.
//!
//! Logs go to stderr; stdout carries only results (ids, paths, JSON).

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use sayface::{Capabilities, Pipeline, SayfaceConfig};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
usage: sayface [--config PATH] <command>

commands:
  avatar <image> [--out DIR]           create an avatar from a photo
  speak <avatar-id> <audio> [--out DIR] render a lip-sync video
  capabilities                         print optional features as JSON";

/// Parsed command line.
struct Args {
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    positional: Vec<String>,
}

fn parse_args(raw: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut args = Args {
        config: None,
        out: None,
        positional: Vec::new(),
    };
    let mut iter = raw.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let value = iter.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(value));
            }
            "--out" | "-o" => {
                let value = iter.next().context("--out needs a directory")?;
                args.out = Some(PathBuf::from(value));
            }
            flag if flag.starts_with('-') && !matches!(flag, "-h" | "--help") => {
                bail!("unknown option `{flag}`\n\n{USAGE}");
            }
            _ => args.positional.push(arg),
        }
    }
    Ok(args)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SayfaceConfig> {
    match path {
        Some(p) => SayfaceConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => {
            let default = SayfaceConfig::default_config_path();
            if default.is_file() {
                Ok(SayfaceConfig::from_file(&default)?)
            } else {
                Ok(SayfaceConfig::default())
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sayface=info")),
        )
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    let mut config = load_config(args.config.as_deref())?;

    let Some(command) = args.positional.first() else {
        println!("{USAGE}");
        return Ok(());
    };

    match (command.as_str(), &args.positional[1..]) {
        ("avatar", [image]) => {
            if let Some(out) = args.out {
                config.storage.avatar_dir = out;
            }
            create_avatar(config, Path::new(image))
        }
        ("speak", [avatar_id, audio]) => {
            if let Some(out) = args.out {
                config.storage.video_dir = out;
            }
            speak(config, avatar_id, Path::new(audio))
        }
        ("capabilities", []) => {
            let caps = Capabilities::detect(&config);
            println!("{}", serde_json::to_string_pretty(&caps)?);
            Ok(())
        }
        ("help" | "-h" | "--help", _) => {
            println!("{USAGE}");
            Ok(())
        }
        (other, _) => bail!("unrecognized command `{other}`\n\n{USAGE}"),
    }
}

fn create_avatar(config: SayfaceConfig, image: &Path) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(image).with_context(|| format!("failed to read {}", image.display()))?;
    let pipeline = Pipeline::new(config)?;
    let created = pipeline.create_avatar(&bytes)?;
    let face = created.features.face;
    info!(
        eyes = created.features.eyes.len(),
        "face at ({}, {}) {}x{}", face.x, face.y, face.w, face.h
    );
    println!("{}", created.stored.id);
    println!("{}", created.stored.image_path.display());
    println!("{}", created.stored.meta_path.display());
    Ok(())
}

fn speak(config: SayfaceConfig, avatar_id: &str, audio: &Path) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config)?;
    let outcome = pipeline.speak(avatar_id, audio, &CancellationToken::new())?;
    match (&outcome.video, &outcome.error) {
        (Some(video), warning) => {
            if let Some(w) = warning {
                eprintln!("warning: {w}");
            }
            println!("{}", video.path.display());
        }
        (None, Some(e)) => eprintln!("warning: no video produced, use the audio alone: {e}"),
        (None, None) => eprintln!("warning: no video produced"),
    }
    Ok(())
}
