//! CLI glue for spaces-publish: argument parsing, the async `run` entrypoint and the
//! workflow-runner output conventions.
//!
//! All pipeline logic lives in [`crate::publish`]. This module only turns inputs into a
//! [`PublishConfig`](crate::config::PublishConfig), builds the real Spaces client, and
//! reports the result the way a GitHub Actions step is expected to:
//! - the public URL is written as the `output_url` step output
//! - failures are emitted as an `::error::` workflow command

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::load_config::{load_config, read_config_file, Inputs};
use crate::publish::{publish, PublishReport};
use crate::upload::SpacesClient;

/// Publish a file or directory to a DigitalOcean Space.
#[derive(Debug, Parser)]
#[clap(
    name = "spaces-publish",
    version,
    about = "Upload a file or directory tree to an S3-compatible Space, optionally versioned and mirrored to latest/"
)]
pub struct Cli {
    /// Optional YAML file providing any of the inputs below
    #[clap(long, env = "INPUT_CONFIG")]
    pub config: Option<PathBuf>,

    #[clap(flatten)]
    pub inputs: Inputs,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<PublishReport> {
    tracing::info!("trace_initialised");

    let result = publish_from_cli(cli).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Publish failed");
        report_failure(&format!("{e:#}"));
    }
    result
}

async fn publish_from_cli(cli: Cli) -> Result<PublishReport> {
    let inputs = match &cli.config {
        Some(path) => cli.inputs.overlay(read_config_file(path)?),
        None => cli.inputs,
    };
    let working_dir = std::env::current_dir().context("Failed to determine working directory")?;
    let config = load_config(inputs, &working_dir)?;
    config.trace_loaded();

    let client = SpacesClient::new(&config.storage);
    let report = publish(&config, &client).await?;

    set_output("output_url", &report.output_url)
        .context("Failed to write step output")?;
    Ok(report)
}

/// Emits a step output: printed as `name=value`, and appended to the file named by
/// `GITHUB_OUTPUT` when running inside a workflow.
pub fn set_output(name: &str, value: &str) -> std::io::Result<()> {
    println!("{name}={value}");
    if let Some(path) = std::env::var_os("GITHUB_OUTPUT").filter(|p| !p.is_empty()) {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{name}={value}")?;
    }
    Ok(())
}

/// Surfaces a failure to the workflow runner. Multi-line messages are escaped
/// as the workflow command syntax requires.
pub fn report_failure(message: &str) {
    if std::env::var("GITHUB_ACTIONS").as_deref() == Ok("true") {
        println!("::error::{}", escape_workflow_data(message));
    }
}

fn escape_workflow_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
