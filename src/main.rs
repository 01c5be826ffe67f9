mod cli;
mod progress;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use cli::Cli;
use progress::CliListener;
use wavethumb::config::{self, Config};
use wavethumb::{NoOpListener, PipelineListener, PngFileSink, Thumbnailer};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect wavethumb.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = PathBuf::from("wavethumb.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("wavethumb").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("wavethumb").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });

    let mut cfg = match config_path {
        Some(ref path) if cli.config.is_some() => config::load_config(path)?,
        Some(ref path) => match config::load_config(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("Ignoring config {}: {:#}", path.display(), err);
                Config::default()
            }
        },
        None => Config::default(),
    };
    if let Some(ref path) = config_path {
        log::info!("Using config from {}", path.display());
    }
    apply_overrides(&mut cfg, &cli);

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("png"));

    log::info!("Input: {}", cli.input.display());
    log::info!("Output: {}", output.display());
    log::info!(
        "Size: {}x{}, palette {:?}, style {:?}",
        cfg.output.width,
        cfg.output.height,
        cfg.output.palette,
        cfg.output.style
    );

    let width = cfg.output.width;
    let thumbnailer = Thumbnailer::new(cfg).context("Invalid thumbnail settings")?;
    let budget = thumbnailer.budget();

    let cli_listener;
    let listener: &dyn PipelineListener = if cli.quiet {
        &NoOpListener
    } else {
        cli_listener = CliListener::new(width);
        &cli_listener
    };

    let thumb = thumbnailer
        .render_file(&cli.input, &budget, listener)
        .with_context(|| format!("Failed to render thumbnail for {}", cli.input.display()))?;

    thumb
        .write_to(&mut PngFileSink::new(&output))
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if let Some(ref report) = cli.report {
        let json = thumb.report_json().context("Failed to serialize report")?;
        std::fs::write(report, json)
            .with_context(|| format!("Failed to write report: {}", report.display()))?;
        log::info!("Report: {}", report.display());
    }

    log::info!("Done! Output: {}", output.display());
    Ok(())
}

/// Command-line flags win over the config file.
fn apply_overrides(cfg: &mut Config, cli: &Cli) {
    if let Some(width) = cli.width { cfg.output.width = width; }
    if let Some(height) = cli.height { cfg.output.height = height; }
    if let Some(palette) = cli.palette { cfg.output.palette = palette; }
    if let Some(style) = cli.style { cfg.output.style = style; }
    if let Some(mix) = cli.mix { cfg.analysis.channel_mix = mix; }
    if cli.max_duration.is_some() { cfg.limits.max_duration_secs = cli.max_duration; }
    if cli.timeout.is_some() { cfg.limits.max_processing_secs = cli.timeout; }
    if cli.normalize { cfg.analysis.normalize = true; }
    if cli.center_line { cfg.output.center_line = true; }
}
