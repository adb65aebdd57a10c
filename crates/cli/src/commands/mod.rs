//! Command implementations
//!
//! Remote paths are written `profile/container/blob`. The first segment picks
//! the profile, the rest is handed to the filesystem unchanged.

use clap::Subcommand;

use bfs_core::{BlobFileSystem, ConfigManager, ObjectInputFile, Profile, RetryConfig};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};
use crate::retry::{is_retryable_error, retry_with_backoff};

pub mod cat;
pub mod profile;
pub mod stat;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage storage account profiles
    #[command(subcommand)]
    Profile(profile::ProfileCommands),

    /// Show size and metadata of a blob
    Stat(stat::StatArgs),

    /// Write a blob, or a byte range of it, to stdout
    Cat(cat::CatArgs),
}

/// Execute a parsed command
pub async fn execute(command: Commands, output_config: OutputConfig) -> ExitCode {
    match command {
        Commands::Profile(cmd) => profile::execute(cmd, output_config).await,
        Commands::Stat(args) => stat::execute(args, output_config).await,
        Commands::Cat(args) => cat::execute(args, output_config).await,
    }
}

/// Split `profile/container/blob` into the profile name and the
/// filesystem path
pub(crate) fn split_remote_path(path: &str) -> Result<(&str, &str), String> {
    if path.is_empty() {
        return Err("Path cannot be empty".to_string());
    }
    match path.split_once('/') {
        Some((profile, rest)) if !profile.is_empty() && !rest.is_empty() => Ok((profile, rest)),
        _ => Err(format!(
            "Expected a path of the form 'profile/container/blob', got '{path}'"
        )),
    }
}

/// Look up a profile, reporting failures through `formatter`
pub(crate) fn load_profile(name: &str, formatter: &Formatter) -> Result<Profile, ExitCode> {
    let manager = match ConfigManager::new() {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return Err(ExitCode::GeneralError);
        }
    };
    let config = match manager.load() {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return Err(ExitCode::GeneralError);
        }
    };
    match config.get(name) {
        Ok(profile) => Ok(profile.clone()),
        Err(_) => {
            formatter.error(&format!("Profile '{name}' not found"));
            Err(ExitCode::NotFound)
        }
    }
}

/// Build the filesystem for a profile without touching the network
pub(crate) fn connect(
    profile: &Profile,
    formatter: &Formatter,
) -> Result<BlobFileSystem, ExitCode> {
    let result = profile.to_options().and_then(bfs_azure::make);
    result.map_err(|e| {
        formatter.error(&format!("Invalid profile '{}': {e}", profile.name));
        ExitCode::from(&e)
    })
}

/// Resolve `path` and open a reader on it, retrying transient failures
pub(crate) async fn open_remote(
    path: &str,
    formatter: &Formatter,
) -> Result<(Profile, ObjectInputFile), ExitCode> {
    let (profile_name, blob_path) = split_remote_path(path).map_err(|e| {
        formatter.error(&e);
        ExitCode::UsageError
    })?;
    let profile = load_profile(profile_name, formatter)?;
    let fs = connect(&profile, formatter)?;
    let retry = profile.retry.clone().unwrap_or_default();

    match open_with_retry(&fs, blob_path, &retry).await {
        Ok(reader) => Ok((profile, reader)),
        Err(e) => {
            formatter.error(&e.to_string());
            Err(ExitCode::from(&e))
        }
    }
}

async fn open_with_retry(
    fs: &BlobFileSystem,
    path: &str,
    retry: &RetryConfig,
) -> bfs_core::Result<ObjectInputFile> {
    retry_with_backoff(retry, || fs.open_reader(path), is_retryable_error).await
}
