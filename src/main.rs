use std::{error::Error, process::ExitCode, sync::Arc};

use clap::{Parser, Subcommand};
use tokio::io::{stdin, stdout, BufReader};
use tracing::info;

use deferkv::{
    classes::{
        config::_config::Config, console::_console::Console, kvstore::_kvstore::open_store,
        logging::_logger::setup_logger,
    },
    TokioIdleScheduler, WriteCoalescer,
};

#[derive(Parser)]
#[command(name = "deferkv", version, about = "Deferred, coalescing writes over a key-value store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read commands from stdin: SET, GET, DEL, RM, COMMIT, CLEAR, PENDING, STATS, WAIT
    Console {
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<String>,
    },
}

async fn run_console(config_path: Option<&str>) -> Result<(), Box<dyn Error>> {
    let config = Config::load_or_default(config_path)?;
    let _guard = setup_logger(&config.logging)?;
    info!("[INIT] Config: {:?}", config);

    let store = open_store(&config.store)?;
    let scheduler = Arc::new(TokioIdleScheduler::try_current(&config.scheduler)?);
    let coalescer = WriteCoalescer::with_config(store, scheduler, &config.coalescer);

    let mut console = Console::new(coalescer);
    console.run(BufReader::new(stdin()), stdout()).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Console { config } => run_console(config.as_deref()).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            ExitCode::FAILURE
        }
    }
}
