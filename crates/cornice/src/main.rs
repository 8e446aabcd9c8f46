mod commands;

use clap::{Parser, Subcommand};

use commands::run::RunArgs;

#[derive(Parser)]
#[command(
    name = "cornice",
    version,
    about = "Colored border overlays for desktop windows"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the border engine in the foreground
    Run(RunArgs),
    /// Send settings to a running engine (key=value tokens)
    Send {
        /// Tokens like `color=#00ccff thickness=3 corner=round`
        tokens: Vec<String>,
    },
    /// Override the bordered window set of a running engine
    Targets {
        /// Window handles in hex (`0x1a2b3c`); none clears the override
        handles: Vec<String>,
    },
    /// Show whether an engine is running
    Status,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Send { tokens } => commands::send::execute(tokens),
        Commands::Targets { handles } => commands::targets::execute(handles),
        Commands::Status => commands::status::execute(),
    }
}
