//! bfs: read blobs from Azure Blob Storage through the blobfs adapter

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_code;
mod output;
mod retry;

use commands::Commands;
use output::OutputConfig;

#[derive(Parser, Debug)]
#[command(name = "bfs", version, about, propagate_version = true)]
struct Cli {
    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Log to stderr so command output on stdout stays clean
///
/// `RUST_LOG` takes precedence; otherwise only warnings are shown unless
/// `--debug` is given.
fn init_tracing(debug: bool) {
    let default = if debug {
        "bfs_core=debug,bfs_azure=debug,blobfs_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color || std::env::var_os("NO_COLOR").is_some(),
        quiet: cli.quiet,
    };

    let code = commands::execute(cli.command, output_config).await;
    tracing::debug!(exit_code = code.as_i32(), "Command finished");
    code.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["bfs", "stat", "local/data/file.txt", "--json", "-q"]);
        assert!(cli.json);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Stat(_)));
    }

    #[test]
    fn test_cat_range_arguments() {
        let cli = Cli::parse_from([
            "bfs", "cat", "local/data/file.txt", "--offset", "10", "--length", "20",
        ]);
        match cli.command {
            Commands::Cat(args) => {
                assert_eq!(args.offset, 10);
                assert_eq!(args.length, Some(20));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
