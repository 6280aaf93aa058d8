use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;

use crate::cli::SubCommandExtend;
use crate::config::{CatalogOptions, EmbedderOptions, Opts};
use crate::embedding::create_embedder;
use crate::recognizer::{Recognition, Recognizer};
use crate::utils::ImageData;

#[derive(Parser, Debug, Clone)]
pub struct MatchCommand {
    #[command(flatten)]
    pub catalog: CatalogOptions,
    #[command(flatten)]
    pub embedder: EmbedderOptions,
    /// 需要识别的图片路径
    pub image: PathBuf,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for MatchCommand {
    async fn run(&self, _opts: &Opts) -> Result<()> {
        let embedder = create_embedder(&self.embedder)?;
        let recognizer = Recognizer::load(&self.catalog, embedder).await?;

        let bytes = tokio::fs::read(&self.image)
            .await
            .with_context(|| format!("failed to read {}", self.image.display()))?;
        let image = ImageData::decode(bytes)
            .with_context(|| format!("failed to decode {}", self.image.display()))?;

        let result = recognizer.recognize(&image).await?;
        print_result(&result, self.output_format)
    }
}

fn print_result(result: &Recognition, format: OutputFormat) -> Result<()> {
    let (status, object_id, planet_id, score) = match result {
        Recognition::Planet { object_id, planet_id, score } => {
            ("success", Some(object_id.as_str()), Some(planet_id.as_str()), *score)
        }
        Recognition::Unmapped { object_id, score } => {
            ("unmapped", Some(object_id.as_str()), None, *score)
        }
        Recognition::NoMatch { score } => ("no_match", None, None, *score),
    };
    match format {
        OutputFormat::Json => {
            let value = json!({
                "status": status,
                "object_id": object_id,
                "planet_id": planet_id,
                "score": score.is_finite().then_some(score),
            });
            println!("{}", serde_json::to_string_pretty(&value)?)
        }
        OutputFormat::Table => {
            println!(
                "{:.2}\t{}\t{}\t{}",
                score,
                status,
                object_id.unwrap_or("-"),
                planet_id.unwrap_or("-")
            );
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Table,
}
