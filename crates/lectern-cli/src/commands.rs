//! Actions shared by one-shot commands and the chat shell.

use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use lectern_core::{collect_pdfs, Answer, BuildReport, Config, PdfSource, Pipeline, VectorStore};

pub type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Gathers every PDF named by `paths` (files or directories).
pub fn gather(paths: &[PathBuf]) -> CliResult<Vec<PdfSource>> {
    let mut sources = Vec::new();
    for path in paths {
        sources.extend(collect_pdfs(path)?);
    }
    Ok(sources)
}

/// Submit & Process: rebuild the index from `paths`.
pub async fn process(pipeline: &Pipeline, paths: &[PathBuf]) -> CliResult<BuildReport> {
    let sources = gather(paths)?;
    let pb = spinner("Processing...");
    match pipeline.process(&sources).await {
        Ok(report) => {
            pb.finish_with_message("Done");
            print_report(&report);
            Ok(report)
        }
        Err(e) => {
            pb.finish_and_clear();
            Err(e.into())
        }
    }
}

pub async fn ask(pipeline: &Pipeline, question: &str, show_sources: bool) -> CliResult<Answer> {
    let answer = pipeline.ask(question).await?;
    println!("Reply: {}", answer.text);
    if show_sources {
        for p in &answer.passages {
            println!("  [{:.3}] {} #{}", p.score, p.chunk.source, p.chunk.index);
        }
    }
    Ok(answer)
}

fn print_report(report: &BuildReport) {
    println!(
        "Indexed {} document(s), {} page(s), {} chunk(s) into {}",
        report.documents,
        report.pages,
        report.chunks,
        report.index_dir.display()
    );
}

pub fn status(config: &Config, config_path: Option<&Path>) {
    println!("Lectern");
    println!("  core: {}", lectern_core::status());
    match config_path {
        Some(p) => println!("  config: {}", p.display()),
        None => println!("  config: defaults / app data directory"),
    }
    let dir = &config.index.dir;
    match VectorStore::load(dir) {
        Ok(store) => println!(
            "  index: {} ({} chunks, {}, {} dims)",
            dir.display(),
            store.len(),
            store.model(),
            store.dimension()
        ),
        Err(e) => println!("  index: {e}"),
    }
    println!(
        "  api key: {}",
        if config.api_key.is_some() { "set" } else { "missing (GOOGLE_API_KEY)" }
    );
}
