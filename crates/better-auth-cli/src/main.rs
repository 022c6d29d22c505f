use clap::{Parser, Subcommand};

mod commands;

/// Better Auth CLI for Payload CMS projects
#[derive(Parser)]
#[command(name = "better-auth", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Payload collection configs for the auth models
    Generate(commands::generate::GenerateArgs),
}

fn main() {
    better_auth_core::env::init_logger();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate(args) => commands::generate::run(args),
    };

    if let Err(e) = result {
        eprintln!("{} {}", colored::Colorize::red("error:"), e);
        std::process::exit(1);
    }
}
