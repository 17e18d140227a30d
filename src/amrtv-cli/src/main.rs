// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use amrtv_engine::{
    Config, Rendered, TransmissionEvent, eval_expr, filter_transmission_events,
    generate_event_view, generate_view, open_table,
};

/// Lay out AMR transmission network views.
#[derive(Parser, Debug)]
#[command(name = "amrtv", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the view for a delimited sample file
    View {
        /// JSON view configuration
        #[arg(long, short)]
        config: PathBuf,
        /// Sample file, tab- or comma-delimited per the configuration
        samples: PathBuf,
        /// Write the view here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Build the view for transmission events exported from the isolate database
    Events {
        /// JSON array of six-column event rows
        events: PathBuf,
        /// JSON view configuration; defaults to the transmission columns
        #[arg(long, short)]
        config: Option<PathBuf>,
        /// JSON mapping of organism group to selected organism groups
        #[arg(long)]
        selected: Option<PathBuf>,
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Evaluate an arithmetic expression
    Eval { expr: String },
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn load_config(path: &Path) -> Result<Config> {
    Config::from_reader(open(path)?)
        .with_context(|| format!("failed to load config {}", path.display()))
}

fn write_view(rendered: &Rendered, output: Option<&Path>, pretty: bool) -> Result<()> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, &rendered.view)?;
    } else {
        serde_json::to_writer(&mut writer, &rendered.view)?;
    }
    writeln!(writer)?;
    writer.flush()?;

    tracing::info!(
        nodes = rendered.view.main_fig_nodes_x.len(),
        edges = rendered.edges.len(),
        diagnostics = rendered.report.diagnostics.len(),
        "wrote view"
    );
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::View {
            config,
            samples,
            output,
            pretty,
        } => {
            let config = load_config(&config)?;
            let (table, read_report) = open_table(&samples, &config)
                .with_context(|| format!("failed to read {}", samples.display()))?;
            let mut rendered = generate_view(&table, &config)?;
            let mut report = read_report;
            report.extend(rendered.report);
            rendered.report = report;
            write_view(&rendered, output.as_deref(), pretty)
        }
        Command::Events {
            events,
            config,
            selected,
            output,
            pretty,
        } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => TransmissionEvent::default_config(),
            };
            let mut rows: Vec<TransmissionEvent> = serde_json::from_reader(open(&events)?)
                .with_context(|| format!("failed to parse events {}", events.display()))?;
            if let Some(path) = selected {
                let selected: BTreeMap<String, BTreeMap<String, serde_json::Value>> =
                    serde_json::from_reader(open(&path)?)
                        .with_context(|| format!("failed to parse {}", path.display()))?;
                rows = filter_transmission_events(&selected, &rows);
            }
            let rendered = generate_event_view(&rows, &config)?;
            write_view(&rendered, output.as_deref(), pretty)
        }
        Command::Eval { expr } => {
            println!("{}", eval_expr(&expr)?);
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    run(Cli::parse())
}
