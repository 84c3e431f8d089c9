//! CLI entry point for Lectern.

mod commands;
mod server;
mod shell;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use lectern_core::{app_data_dir, load_config, logging, save_config, Config, ConfigError, Pipeline};

use crate::commands::CliResult;

#[derive(Parser)]
#[command(name = "lectern", version)]
#[command(about = "Lectern: ask questions about your PDF documents")]
struct Cli {
    /// Config file to use instead of config.toml in the app data directory.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where the index lives (default: ./faiss_index).
    #[arg(long, global = true, value_name = "DIR")]
    index_dir: Option<PathBuf>,

    /// Gemini API key.
    #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show settings and whether an index exists.
    Status,
    /// Show where Lectern stores its config (app data directory).
    DataDir,
    /// Write a config.toml with default settings to the app data directory.
    InitConfig,
    /// Extract, chunk and embed PDFs, replacing the index.
    Process {
        /// PDF files or directories containing PDFs.
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
    /// Answer a question from the indexed documents.
    Ask {
        #[arg(value_name = "QUESTION", required = true, num_args = 1..)]
        question: Vec<String>,
        /// Also list the passages the answer was grounded on.
        #[arg(long)]
        sources: bool,
    },
    /// Interactive shell: process documents and ask questions.
    Chat,
    /// Serve the build and query endpoints over HTTP.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value = "3000")]
        port: u16,
    },
}

fn load_settings(cli: &Cli) -> Result<Config, ConfigError> {
    let config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => load_config(),
    };
    let mut config = config.with_env();
    if let Some(dir) = &cli.index_dir {
        config = config.with_index_dir(dir);
    }
    if let Some(key) = &cli.api_key {
        config = config.with_api_key(key);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match load_settings(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.logging);

    let config_path = cli.config.clone();
    match run(cli.command.unwrap_or(Commands::Status), config, config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: Config, config_path: Option<PathBuf>) -> CliResult<()> {
    match command {
        Commands::Status => commands::status(&config, config_path.as_deref()),
        Commands::DataDir => match app_data_dir() {
            Some(p) => println!("{}", p.display()),
            None => eprintln!("Could not determine app data directory."),
        },
        Commands::InitConfig => {
            let path = save_config(&Config::default())?;
            println!("Wrote {}", path.display());
        }
        Commands::Process { paths } => {
            let pipeline = Pipeline::from_config(config)?;
            commands::process(&pipeline, &paths).await?;
        }
        Commands::Ask { question, sources } => {
            let pipeline = Pipeline::from_config(config)?;
            commands::ask(&pipeline, &question.join(" "), sources).await?;
        }
        Commands::Chat => {
            let pipeline = Pipeline::from_config(config)?;
            shell::run(&pipeline).await?;
        }
        Commands::Serve { host, port } => {
            let addr: SocketAddr = format!("{host}:{port}").parse()?;
            let pipeline = Arc::new(Pipeline::from_config(config)?);
            server::serve(pipeline, addr).await?;
        }
    }
    Ok(())
}
