use anyhow::{Context, Result};
use bookvoice::core::config::Config;
use bookvoice::services::workflow::Workflow;
use std::fs;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let manuscript_path = std::env::args()
        .nth(1)
        .context("usage: bookvoice <manuscript.txt>")?;

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with valid API credentials.");
            return Err(e);
        }
    };
    config.ensure_directories()?;

    let text = fs::read_to_string(&manuscript_path)
        .with_context(|| format!("Failed to read manuscript: {}", manuscript_path))?;

    let mut workflow = Workflow::new(config.clone());
    workflow.load_manuscript(text)?;

    println!("Analyzing characters...");
    let roster = workflow.extract_characters().await?;
    println!("Identified {} characters:", roster.len());
    for character in roster {
        println!(
            "  [{}] {} ({}, {})",
            character.story_relevance.as_str(),
            character.name,
            character.gender,
            character.age_range
        );
    }

    let run_tagging = if config.unattended {
        true
    } else {
        inquire::Confirm::new("Add emotion and cadence tags?")
            .with_default(true)
            .prompt()?
    };

    if run_tagging {
        let (segments, warning) = workflow.tag_emotions().await?;
        println!("Tagged {} chunks", segments.len());
        if let Some(warning) = warning {
            eprintln!("Warning: {}", warning);
        }
    }

    let out_dir = Path::new(&config.output_folder);
    fs::write(
        out_dir.join("audiobook-analysis.json"),
        workflow.analysis_json()?,
    )?;
    if let Some(document) = workflow.tagged_text_document() {
        fs::write(out_dir.join("tagged-audiobook-text.txt"), document)?;
    }
    println!("Exports written to {}", config.output_folder);

    workflow.cleanup_remote().await;
    Ok(())
}
