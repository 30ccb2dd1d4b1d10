// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! A simple interactive shell over a storage root.

use std::fs::File;

use anyhow::{Result, anyhow};
use clap::Parser;
use filelight::Session;
use filelight::config::Properties;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::{select, signal};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter;
use tracing_subscriber::prelude::*;

/// filelight: query file-backed datasets with SQL.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Connection URL, e.g. `filelight:/data?format=csv`.
    url: String,

    /// SQL file to execute. Statements are separated by `;`.
    #[clap(short, long)]
    file: Option<String>,

    /// Connection property, e.g. `-c csv.has_header=false`. May be repeated.
    #[clap(short = 'c', long = "conf", value_parser = parse_property)]
    properties: Vec<(String, String)>,
}

fn parse_property(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got {s:?}"))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

/// Run one line of input: a meta command or a query.
async fn run_line(session: &Session, line: &str) -> Result<()> {
    let line = line.trim().trim_end_matches(';');
    if line == "\\dt" {
        session.tables()?.show().await?;
    } else if let Some(table) = line.strip_prefix("\\d ") {
        session.columns(table.trim())?.show().await?;
    } else if !line.is_empty() {
        let df = session.execute_query(line).await?;
        df.show().await?;
    }
    Ok(())
}

/// Run a line, or give up on it when Ctrl-C is pressed.
async fn run_line_cancellable(session: &Session, line: &str) -> Result<()> {
    select! {
        _ = signal::ctrl_c() => {
            println!("Interrupted");
            Ok(())
        }
        ret = run_line(session, line) => ret,
    }
}

/// Run interactive mode
async fn interactive(session: Session) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let history_path = dirs::cache_dir().map(|p| {
        let cache_dir = p.join("filelight");
        std::fs::create_dir_all(cache_dir.as_path()).ok();
        let history_path = cache_dir.join("history.txt");
        if !history_path.as_path().exists() {
            File::create(history_path.as_path()).ok();
        }
        history_path.into_boxed_path()
    });

    if let Some(ref history_path) = history_path
        && let Err(err) = rl.load_history(history_path)
    {
        println!("No previous history. {err}");
    }
    loop {
        let readline = rl.readline("> ");
        match readline {
            Ok(line) => {
                if line.trim() == "\\q" {
                    break;
                }
                rl.add_history_entry(line.as_str()).ok();
                if let Err(err) = run_line_cancellable(&session, &line).await {
                    println!("{err}");
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
            }
            Err(ReadlineError::Eof) => {
                println!("Exited");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }

    if let Some(ref history_path) = history_path
        && let Err(err) = rl.save_history(history_path)
    {
        println!("Save history failed, {err}");
    }

    Ok(())
}

/// Run a SQL file
async fn run_sql(session: Session, path: &str) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    for sql in content.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        info!("{}", sql);
        run_line_cancellable(&session, sql).await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let fmt_layer = tracing_subscriber::fmt::layer().compact();
    let filter_layer =
        filter::EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let properties: Properties = args.properties.into_iter().collect();
    let session = filelight::connect_url(&args.url, properties)?;

    if let Some(file) = args.file {
        run_sql(session, &file).await?;
    } else {
        interactive(session).await?;
    }

    Ok(())
}
