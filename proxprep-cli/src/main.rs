mod cli;
mod error;

use clap::Parser;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

use cli::Cli;
use error::{exit_with_error, CliError, CliResult};
use proxprep_pipeline::{init_logging, PrepConfig, PrepRun};

fn main() {
    let cli = Cli::parse();

    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        exit_with_error(e);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = build_config(cli)?;

    // Logging lives exactly as long as the run; dropping the guard
    // flushes the dated log file.
    let _log = init_logging(&config.log_dir)?;

    let report = PrepRun::new(config)?.run()?;

    println!(
        "{} {} communities, {} output rows ({} points synthesized)",
        "done:".green().bold(),
        report.communities,
        report.output_rows,
        report.synthesized_points,
    );
    if !report.missing_primary.is_empty() {
        print_missing("primary", &report.missing_primary);
    }
    if !report.missing_advisory.is_empty() {
        print_missing("advisory", &report.missing_advisory);
    }
    Ok(())
}

fn print_missing(kind: &str, ids: &[i64]) {
    let rendered: Vec<String> = ids.iter().map(i64::to_string).collect();
    println!(
        "{} {} {kind} site ids not in the registry: {}",
        "warning:".yellow().bold(),
        ids.len(),
        rendered.join(", "),
    );
}

/// Build the run configuration from an optional JSON config file plus
/// command-line overrides. The five data paths must come from one or
/// the other.
fn build_config(cli: Cli) -> CliResult<PrepConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| CliError::Input(format!("read {}: {e}", path.display())))?;
            serde_json::from_str::<PrepConfig>(&text)
                .map_err(|e| CliError::Input(format!("parse {}: {e}", path.display())))?
        }
        None => {
            let workspace = require(cli.workspace.clone(), "--workspace")?;
            let scratch = require(cli.scratch.clone(), "--scratch")?;
            let site_a = require(cli.site_a.clone(), "--site-a")?;
            let adv_pd = require(cli.adv_pd.clone(), "--adv-pd")?;
            let site_p = require(cli.site_p.clone(), "--site-p")?;
            PrepConfig::new(workspace, scratch, site_a, adv_pd, site_p)
        }
    };

    if let Some(v) = cli.workspace {
        config.default_workspace = v;
    }
    if let Some(v) = cli.scratch {
        config.scratch_workspace = v;
    }
    if let Some(v) = cli.site_a {
        config.site_a_path = v;
    }
    if let Some(v) = cli.adv_pd {
        config.adv_pd_path = v;
    }
    if let Some(v) = cli.site_p {
        config.site_p_path = v;
    }
    if let Some(v) = cli.community_layer {
        config.community_layer = v;
    }
    if let Some(v) = cli.building_layer {
        config.building_layer = v;
    }
    if let Some(v) = cli.out_name {
        config.out_name = v;
    }
    if let Some(v) = cli.wkid {
        config.wkid = v;
    }
    if cli.keep_artifacts {
        config.keep_artifacts = true;
    }
    if let Some(v) = cli.log_dir {
        config.log_dir = v;
    }
    Ok(config)
}

fn require(value: Option<PathBuf>, flag: &str) -> CliResult<PathBuf> {
    value.ok_or_else(|| CliError::Usage(format!("{flag} is required without --config")))
}
