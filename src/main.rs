mod commands;
mod errors;
mod installers;
mod libs;
mod logger;
mod schemas;
#[cfg(test)]
mod test_support;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use commands::{now, version};
use errors::SetupError;

#[derive(Parser)]
#[command(name = "setup-shell")]
#[command(about = "Bootstrap a zsh workstation: Homebrew, Oh My Zsh, plugins, Starship and uv", long_about = None)]
struct Cli {
    /// Turn debugging information on
    #[arg(short, long, global = true)]
    debug: bool,

    /// Alternative configuration file (defaults to ~/.setup-shell/config.yaml)
    #[arg(long, global = true, env = "SETUP_SHELL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// Run setup now (the default)
    Now,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.debug);

    let result = match cli.command.unwrap_or(Commands::Now) {
        Commands::Version => {
            version::run();
            Ok(())
        }
        Commands::Now => now::run(cli.config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log_error!("{:#}", err);
            let code = err
                .downcast_ref::<SetupError>()
                .map_or(1, SetupError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
