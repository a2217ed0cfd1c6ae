// SPDX-License-Identifier: AGPL-3.0-or-later
//! `remarkup`: render, export and translate Remarkup documents

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::ImportReport;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "remarkup", version, about = "Render and translate Remarkup documents")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render Remarkup to HTML
    Html {
        /// Input file, `-` or nothing for standard input
        input: Option<PathBuf>,
    },
    /// Dump the token tree as JSON
    Tokens {
        input: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Export Remarkup to pseudo-XML
    ToXml { input: Option<PathBuf> },
    /// Rebuild Remarkup from pseudo-XML
    FromXml { input: Option<PathBuf> },
    /// Translate a document with the configured backend
    Translate {
        input: Option<PathBuf>,
        /// Source language, overrides the configuration
        #[arg(long)]
        from: Option<String>,
        /// Target language, overrides the configuration
        #[arg(long)]
        to: Option<String>,
        /// Identifier the translation keys are derived from
        #[arg(long, default_value = "stdin")]
        id: String,
        /// Dictionary CSV for the dictionary backend
        #[arg(long)]
        dictionary: Option<PathBuf>,
        /// Allow sending the document to a remote service
        #[arg(short, long)]
        yes: bool,
    },
    /// Write the translation units of documents as CSV
    ExportDictionary {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply a filled-in CSV dictionary to documents
    ImportDictionary {
        dictionary: PathBuf,
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Directory for translated documents; standard output otherwise
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let mut config = commands::load_config(cli.config.as_deref())?;
    let engine = commands::engine(&config);

    match cli.command {
        Command::Html { input } => {
            let markup = commands::read_input(input.as_deref()).await?;
            let html = engine.to_html(&markup);
            commands::write_output(None, html.as_bytes()).await?;
        }
        Command::Tokens { input, pretty } => {
            let markup = commands::read_input(input.as_deref()).await?;
            let json = commands::tokens(&engine, &markup, pretty)?;
            println!("{json}");
        }
        Command::ToXml { input } => {
            let markup = commands::read_input(input.as_deref()).await?;
            commands::write_output(None, engine.to_xml(&markup).as_bytes()).await?;
        }
        Command::FromXml { input } => {
            let xml = commands::read_input(input.as_deref()).await?;
            let markup = commands::from_xml(&engine, &xml)?;
            commands::write_output(None, markup.as_bytes()).await?;
        }
        Command::Translate {
            input,
            from,
            to,
            id,
            dictionary,
            yes,
        } => {
            if let Some(from) = from {
                config.source_lang = from;
            }
            if let Some(to) = to {
                config.target_lang = to;
            }
            let markup = commands::read_input(input.as_deref()).await?;
            let translated =
                commands::translate(&config, &markup, &id, yes, dictionary.as_deref()).await?;
            commands::write_output(None, translated.as_bytes()).await?;
        }
        Command::ExportDictionary { inputs, output } => {
            let mut documents = Vec::with_capacity(inputs.len());
            for path in &inputs {
                documents.push(commands::load_document(path).await?);
            }
            let csv = commands::export_dictionary(&config, &documents).await?;
            commands::write_output(output.as_deref(), &csv).await?;
        }
        Command::ImportDictionary {
            dictionary,
            inputs,
            output_dir,
        } => {
            let bytes = tokio::fs::read(&dictionary)
                .await
                .with_context(|| format!("Failed to read {}", dictionary.display()))?;
            let mut documents = Vec::with_capacity(inputs.len());
            for path in &inputs {
                documents.push(commands::load_document(path).await?);
            }
            let imported = commands::import_dictionary(&config, &bytes, &documents).await?;

            let mut report = Vec::with_capacity(imported.len());
            for (path, document) in inputs.iter().zip(&imported) {
                match &output_dir {
                    Some(dir) => {
                        let target = dir.join(path.file_name().unwrap_or(path.as_os_str()));
                        commands::write_output(Some(target.as_path()), document.content.as_bytes())
                            .await?;
                    }
                    None => println!("{}", document.content),
                }
                report.push(ImportReport {
                    path: path.clone(),
                    title: document.title.clone(),
                    more_translation_needed: document.more_translation_needed,
                });
            }
            eprintln!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
