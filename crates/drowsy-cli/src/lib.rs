//! Eye-watch command line
//!
//! Argument parsing, layered settings and logging setup for the `eyewatch`
//! binary. Settings are resolved as: subcommand preset → optional config
//! file → `EYEWATCH__*` environment variables → command-line flags.

use anyhow::Context;
use camera_capture::CameraConfig;
use clap::{Args, Parser, Subcommand};
use config::{Config, Environment, File};
use dms::{DmsConfig, EnhancementMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Webcam eye detection: night preview and drowsiness watch.
#[derive(Debug, Parser)]
#[command(name = "eyewatch", version)]
pub struct Cli {
    /// TOML/YAML/JSON settings file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Enhanced grayscale preview with face and eye boxes (night mode).
    Preview(RunArgs),
    /// Color preview with a warning banner when eyes go unseen.
    Watch(RunArgs),
}

impl Command {
    pub fn args(&self) -> &RunArgs {
        match self {
            Command::Preview(args) | Command::Watch(args) => args,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Camera device index.
    #[arg(long, conflicts_with = "input")]
    pub camera: Option<i32>,

    /// Replay images from a directory instead of a camera.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Low-light enhancement and detection parameters.
    #[arg(long, conflicts_with = "day")]
    pub night: bool,

    /// Daylight enhancement and detection parameters.
    #[arg(long)]
    pub day: bool,

    /// Mirror the preview horizontally.
    #[arg(long, conflicts_with = "no_mirror")]
    pub mirror: bool,

    /// Show frames as captured, even when the preset mirrors them.
    #[arg(long)]
    pub no_mirror: bool,

    /// Run without a window; analysis goes to the log.
    #[arg(long)]
    pub headless: bool,

    /// Seconds without eyes before the warning.
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Face cascade model file.
    #[arg(long)]
    pub face_cascade: Option<PathBuf>,

    /// Eye cascade model file.
    #[arg(long)]
    pub eye_cascade: Option<PathBuf>,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// JSON output instead of compact text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub camera: CameraConfig,
    pub dms: DmsConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Preset for a subcommand
    pub fn preset(command: &Command) -> Self {
        match command {
            Command::Preview(_) => Self {
                camera: CameraConfig::night(),
                dms: DmsConfig::night_preview(),
                ..Default::default()
            },
            Command::Watch(_) => Self {
                camera: CameraConfig::day(),
                dms: DmsConfig::watch(),
                ..Default::default()
            },
        }
    }

    /// Layer a settings file and the environment over `base`
    pub fn load(base: &Settings, file: Option<&Path>) -> anyhow::Result<Settings> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(base).context("invalid base settings")?);

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix("EYEWATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read settings")?
            .try_deserialize()
            .context("failed to parse settings")
    }

    /// Apply command-line overrides
    pub fn apply_args(&mut self, args: &RunArgs) {
        if let Some(device) = args.camera {
            self.camera.device = device;
        }
        if args.night {
            self.use_mode(EnhancementMode::Night);
        }
        if args.day {
            self.use_mode(EnhancementMode::Day);
        }
        if args.mirror {
            self.camera.mirror = true;
        }
        if args.no_mirror {
            self.camera.mirror = false;
        }
        if let Some(threshold) = args.threshold {
            self.dms.drowsiness_threshold_secs = threshold;
        }
        if let Some(path) = &args.face_cascade {
            self.dms.face_cascade_path = path.clone();
        }
        if let Some(path) = &args.eye_cascade {
            self.dms.eye_cascade_path = path.clone();
        }
    }

    /// Switch lighting mode, along with the capture size suited to it
    fn use_mode(&mut self, mode: EnhancementMode) {
        let preset = match mode {
            EnhancementMode::Day => CameraConfig::day(),
            EnhancementMode::Night => CameraConfig::night(),
        };
        self.dms.mode = mode;
        self.camera.width = preset.width;
        self.camera.height = preset.height;
    }
}

/// Resolve settings for a parsed command line
pub fn resolve_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let base = Settings::preset(&cli.command);
    let mut settings = Settings::load(&base, cli.config.as_deref())?;
    settings.apply_args(cli.command.args());
    if cli.log_json {
        settings.logging.json = true;
    }
    settings
        .dms
        .validate()
        .context("invalid monitor settings")?;
    Ok(settings)
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("invalid log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("eyewatch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_preview_defaults_to_night() {
        let cli = parse(&["preview"]);
        let settings = resolve_settings(&cli).unwrap();

        assert_eq!(settings.dms.mode, EnhancementMode::Night);
        assert!(!settings.dms.show_alert);
        assert_eq!((settings.camera.width, settings.camera.height), (640, 480));
        assert!(settings.camera.mirror);
    }

    #[test]
    fn test_watch_flags_override_preset() {
        let cli = parse(&[
            "watch",
            "--camera",
            "2",
            "--night",
            "--threshold",
            "4.5",
            "--eye-cascade",
            "/models/eye.xml",
        ]);
        let settings = resolve_settings(&cli).unwrap();

        assert_eq!(settings.camera.device, 2);
        assert_eq!(settings.dms.mode, EnhancementMode::Night);
        assert_eq!((settings.camera.width, settings.camera.height), (640, 480));
        assert_eq!(settings.dms.drowsiness_threshold_secs, 4.5);
        assert_eq!(settings.dms.eye_cascade_path, PathBuf::from("/models/eye.xml"));
        assert!(settings.dms.show_alert);
    }

    #[test]
    fn test_no_mirror_overrides_preview_preset() {
        let cli = parse(&["preview", "--no-mirror"]);
        let settings = resolve_settings(&cli).unwrap();
        assert!(!settings.camera.mirror);

        let conflicting = Cli::try_parse_from(["eyewatch", "watch", "--mirror", "--no-mirror"]);
        assert!(conflicting.is_err());
    }

    #[test]
    fn test_camera_and_input_conflict() {
        let result = Cli::try_parse_from(["eyewatch", "watch", "--camera", "0", "--input", "frames"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_file_layers_over_preset() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[dms]\ndrowsiness_threshold_secs = 7.0\nalert_message = \"STAY AWAKE\"\n\n[camera]\nfps = 15.0\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let cli = parse(&["--config", file.path().to_str().unwrap(), "watch"]);
        let settings = resolve_settings(&cli).unwrap();

        assert_eq!(settings.dms.drowsiness_threshold_secs, 7.0);
        assert_eq!(settings.dms.alert_message, "STAY AWAKE");
        assert_eq!(settings.camera.fps, 15.0);
        assert_eq!(settings.camera.width, 1280);
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn test_missing_settings_file_is_an_error() {
        let cli = parse(&["--config", "/nonexistent/eyewatch.toml", "watch"]);
        assert!(resolve_settings(&cli).is_err());
    }

    #[test]
    fn test_invalid_threshold_is_rejected() {
        let cli = parse(&["watch", "--threshold=-3"]);
        assert!(resolve_settings(&cli).is_err());
    }
}
