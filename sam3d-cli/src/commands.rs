//! CLI subcommand handlers.
//!
//! Each handler returns whether the command succeeded from the user's point of view;
//! `main` turns that into the process exit status.

use crate::Commands;
use crate::ConfigAction;
use anyhow::Context;
use sam3d_core::{
    CheckpointRoot, ConfigOverrides, DiscoveryResult, ResolveError, Verdict, VerifyConfig,
    discover_with, format_report, format_summary, summarize_tree,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Handle a CLI subcommand.
pub fn handle_command(command: Commands, workspace: &Path) -> anyhow::Result<bool> {
    match command {
        Commands::Verify {
            checkpoints_dir,
            json,
            skip_size,
        } => {
            let overrides = ConfigOverrides {
                checkpoints_dir,
                measure_size: skip_size.then_some(false),
                ..ConfigOverrides::default()
            };
            handle_verify(&load_config(workspace, &overrides)?, json)
        }
        Commands::Inspect {
            checkpoints_dir,
            limit,
        } => {
            let overrides = ConfigOverrides {
                checkpoints_dir,
                report_limit: limit,
                ..ConfigOverrides::default()
            };
            handle_inspect(&load_config(workspace, &overrides)?)
        }
        Commands::Config { action } => handle_config(action, workspace),
    }
}

fn load_config(workspace: &Path, overrides: &ConfigOverrides) -> anyhow::Result<VerifyConfig> {
    let config = sam3d_core::load_config(Some(workspace), overrides)
        .map_err(|e| ResolveError::config(e.to_string()))?;
    Ok(config)
}

/// Make the checkpoints directory absolute against the current directory.
fn resolve_dir(dir: &Path) -> anyhow::Result<PathBuf> {
    std::path::absolute(dir)
        .with_context(|| format!("Failed to resolve checkpoints path {}", dir.display()))
}

/// Discovery result with its verdict, as printed by `verify --json`.
#[derive(Serialize)]
struct VerifyOutput<'a> {
    #[serde(flatten)]
    result: &'a DiscoveryResult,
    verdict: Verdict,
    pass: bool,
}

fn render_verify(result: &DiscoveryResult, json: bool) -> anyhow::Result<String> {
    if json {
        let output = VerifyOutput {
            result,
            verdict: result.verdict(),
            pass: result.pass(),
        };
        let mut text = serde_json::to_string_pretty(&output)?;
        text.push('\n');
        Ok(text)
    } else {
        Ok(format_report(result))
    }
}

fn handle_verify(config: &VerifyConfig, json: bool) -> anyhow::Result<bool> {
    let root = CheckpointRoot::new(resolve_dir(&config.checkpoints_dir)?);
    let result = discover_with(&root, &config.discovery_options())
        .with_context(|| format!("Failed to scan checkpoints in {}", root.path().display()))?;

    info!(
        root = %result.root().display(),
        layout = %result.format(),
        verdict = %result.verdict(),
        "verification finished"
    );
    print!("{}", render_verify(&result, json)?);
    Ok(result.pass())
}

fn handle_inspect(config: &VerifyConfig) -> anyhow::Result<bool> {
    let dir = resolve_dir(&config.checkpoints_dir)?;
    let summary = summarize_tree(&dir, config.report_limit)
        .with_context(|| format!("Failed to list {}", dir.display()))?;

    info!(
        root = %summary.root.display(),
        files = summary.file_count,
        "inspection finished"
    );
    print!("{}", format_summary(&summary));
    Ok(summary.exists)
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<bool> {
    match action {
        ConfigAction::Show => {
            let config = load_config(workspace, &ConfigOverrides::default())?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(true)
        }
    }
}
