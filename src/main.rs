use clap::{Parser, Subcommand};
use dpma_register::config::RegisterConfig;
use dpma_register::runtime::logging::{init_logging, LogLevel};
use dpma_register::types::OutputFormat;
use dpma_register::{RegisterAccess, RegisterError};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "dpmaregister", version)]
#[command(about = "Access DPMAregister file information")]
struct Cli {
    /// Enable debug messages
    #[arg(long, global = true)]
    debug: bool,

    /// JSON file overriding register URLs and throttling
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch register information for a document number
    Fetch {
        document_number: String,

        /// Format for acquisition and output
        #[arg(long, value_enum, default_value_t = OutputFormat::Xml)]
        format: OutputFormat,

        #[arg(long)]
        language: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(if cli.debug {
        LogLevel::Debug
    } else {
        LogLevel::Info
    });

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(RegisterError::NotFound(number)) => {
            tracing::warn!("No results for document {}", number);
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<(), RegisterError> {
    let config = match &cli.config {
        Some(path) => RegisterConfig::load_from_file(path)?,
        None => RegisterConfig::default(),
    };

    match cli.command {
        Command::Fetch {
            document_number,
            format,
            language,
        } => {
            let language = language.unwrap_or_else(|| config.language.clone());
            let mut register = RegisterAccess::new(config)?;
            let payload = register.access(&document_number, format, &language).await?;

            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&payload)?;
            stdout.write_all(b"\n")?;
            stdout.flush()?;
            Ok(())
        }
    }
}
