use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "marbles-cli", version, about = "Marbles sprint timer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sprint timer control
    Sprint {
        #[command(subcommand)]
        action: commands::sprint::SprintAction,
    },
    /// Settings management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Sprint { action } => commands::sprint::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
