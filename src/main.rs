use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use criticore::forward::{forward_records, score_rows};
use criticore::{
    init_logger, sheet, BuiltinModel, ModelManager, Scorer, ScorerBuilder, Settings,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP scoring service
    Serve,
    /// Convert an anomaly workbook to JSON records
    Convert {
        /// Path to the .xlsx workbook
        #[arg(short, long)]
        input: PathBuf,
        /// Sheet to read; falls back to the first sheet
        #[arg(short, long)]
        sheet: Option<String>,
        /// Write records here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Score every row of a workbook, optionally forwarding the records
    Ingest {
        /// Path to the .xlsx workbook
        #[arg(short, long)]
        input: PathBuf,
        /// Sheet to read; falls back to the first sheet
        #[arg(short, long)]
        sheet: Option<String>,
        /// Endpoint to POST scored records to (overrides FORWARD_URL)
        #[arg(long)]
        forward: Option<String>,
    },
    /// Download and verify the managed model artifact
    Fetch {
        /// Force a fresh download of the model files
        #[arg(short, long)]
        fresh: bool,
    },
}

/// Builds the scorer from explicit paths when `MODEL_PATH` and
/// `TOKENIZER_PATH` are both set, from the managed artifact cache
/// otherwise.
async fn build_scorer(settings: &Settings) -> anyhow::Result<Scorer> {
    let scorer = match (&settings.model_path, &settings.tokenizer_path) {
        (Some(model_path), Some(tokenizer_path)) => {
            info!("Loading model from {}", model_path);
            ScorerBuilder::new()
                .with_custom_model(model_path, tokenizer_path, Some(settings.max_length))?
                .build()?
        }
        _ => {
            let manager = ModelManager::new_default()?;
            let model = BuiltinModel::CamembertCriticality;
            manager.ensure_model_downloaded(model).await?;
            ScorerBuilder::new()
                .with_model(model)?
                .with_max_length(settings.max_length)
                .build()?
        }
    };
    info!("Scorer ready: {:?}", scorer.info());
    Ok(scorer)
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    let scorer = Arc::new(build_scorer(&settings).await?);
    criticore::server::run(settings, scorer).await?;
    Ok(())
}

fn convert(
    input: PathBuf,
    sheet_name: Option<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let extracted = sheet::read_workbook(&input, sheet_name.as_deref())
        .with_context(|| format!("failed to read {:?}", input))?;
    info!(
        "Extracted {} rows from sheet {:?}",
        extracted.total_rows, extracted.sheet_used
    );

    let payload = serde_json::json!({
        "success": true,
        "data": extracted.rows,
        "total_rows": extracted.total_rows,
        "sheet_used": extracted.sheet_used,
        "available_sheets": extracted.available_sheets,
    });
    let rendered = serde_json::to_string_pretty(&payload)?;

    match output {
        Some(path) => {
            fs::write(&path, rendered).with_context(|| format!("failed to write {:?}", path))?
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

async fn ingest(
    settings: Settings,
    input: PathBuf,
    sheet_name: Option<String>,
    forward: Option<String>,
) -> anyhow::Result<()> {
    let extracted = sheet::read_workbook(&input, sheet_name.as_deref())
        .with_context(|| format!("failed to read {:?}", input))?;
    info!(
        "Extracted {} rows from sheet {:?}",
        extracted.total_rows, extracted.sheet_used
    );

    let scorer = build_scorer(&settings).await?;
    let records = score_rows(&scorer, &extracted.rows);
    info!("Scored {}/{} rows", records.len(), extracted.total_rows);

    if let Some(url) = forward.or(settings.forward_url) {
        let forwarded = forward_records(&url, &records, settings.forward_chunk).await;
        info!("Forwarded {}/{} records to {}", forwarded, records.len(), url);
    }

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

async fn fetch(fresh: bool) -> anyhow::Result<()> {
    let manager = ModelManager::new_default()?;
    let model = BuiltinModel::CamembertCriticality;

    if fresh {
        info!("Fresh download requested, removing any existing model files");
        manager.remove_download(model)?;
    }

    manager.ensure_model_downloaded(model).await?;
    info!("Model artifact ready");
    Ok(())
}

#[actix_web::main]
async fn main() {
    let settings = Settings::from_env();
    init_logger(&settings.log_level);
    let args = Args::parse();

    let result = match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(settings).await,
        Command::Convert {
            input,
            sheet,
            output,
        } => convert(input, sheet, output),
        Command::Ingest {
            input,
            sheet,
            forward,
        } => ingest(settings, input, sheet, forward).await,
        Command::Fetch { fresh } => fetch(fresh).await,
    };

    if let Err(e) = result {
        // Script consumers parse stderr, so failures keep the JSON
        // envelope shape
        eprintln!(
            "{}",
            serde_json::json!({ "success": false, "error": format!("{:#}", e) })
        );
        std::process::exit(1);
    }
}
