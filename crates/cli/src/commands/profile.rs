//! Profile management commands
//!
//! Profiles are named storage accounts together with the credentials used
//! to read from them.

use clap::Subcommand;
use serde::Serialize;

use bfs_core::{AzureBackend, ConfigManager, Profile};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, Tone};

/// Profile subcommands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Add or update a profile
    Set(SetArgs),

    /// List all configured profiles
    List(ListArgs),

    /// Remove a profile
    Remove(RemoveArgs),
}

/// Arguments for the `profile set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Profile name (e.g., "local", "prod")
    pub name: String,

    /// Storage account name
    pub account: String,

    /// Base64 account key for Shared Key authorization
    #[arg(long, env = "BFS_ACCOUNT_KEY", conflicts_with = "sas")]
    pub key: Option<String>,

    /// Shared access signature token
    #[arg(long)]
    pub sas: Option<String>,

    /// Use the local storage emulator instead of Azure
    #[arg(long)]
    pub azurite: bool,

    /// Custom blob endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,
}

/// Arguments for the `profile list` command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show endpoints as well
    #[arg(short, long)]
    pub long: bool,
}

/// Arguments for the `profile remove` command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Name of the profile to remove
    pub name: String,
}

#[derive(Serialize)]
struct ProfileListOutput {
    profiles: Vec<ProfileInfo>,
}

/// Profile information for JSON output (without credentials)
#[derive(Serialize)]
struct ProfileInfo {
    name: String,
    account: String,
    backend: String,
    auth: String,
    blob_endpoint: String,
}

impl ProfileInfo {
    fn new(profile: &Profile) -> Self {
        let blob_endpoint = profile
            .to_options()
            .map(|o| o.account_blob_url)
            .unwrap_or_default();
        Self {
            name: profile.name.clone(),
            account: profile.account_name.clone(),
            backend: profile.backend.to_string(),
            auth: profile.auth_label().to_string(),
            blob_endpoint,
        }
    }
}

#[derive(Serialize)]
struct ProfileOperationOutput {
    success: bool,
    profile: String,
    message: String,
}

/// Execute a profile subcommand
pub async fn execute(cmd: ProfileCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let manager = match ConfigManager::new() {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::GeneralError;
        }
    };

    match cmd {
        ProfileCommands::Set(args) => execute_set(args, &manager, &formatter),
        ProfileCommands::List(args) => execute_list(args, &manager, &formatter),
        ProfileCommands::Remove(args) => execute_remove(args, &manager, &formatter),
    }
}

fn execute_set(args: SetArgs, manager: &ConfigManager, formatter: &Formatter) -> ExitCode {
    if args.name.is_empty() || args.name.contains('/') {
        formatter.error("Profile name must be non-empty and cannot contain '/'");
        return ExitCode::UsageError;
    }

    let mut profile = Profile::new(&args.name, &args.account);
    if args.azurite {
        profile.backend = AzureBackend::Azurite;
    }
    profile.account_key = args.key;
    profile.sas_token = args.sas;
    profile.blob_endpoint = args.endpoint;

    // Catch bad endpoints and keys now rather than on first use
    if let Err(e) = profile.to_options().and_then(bfs_azure::make) {
        formatter.error(&e.to_string());
        return ExitCode::UsageError;
    }

    let result = manager.load().and_then(|mut config| {
        config.set(profile);
        manager.save(&config)
    });

    match result {
        Ok(()) => {
            let output = ProfileOperationOutput {
                success: true,
                profile: args.name.clone(),
                message: format!("Profile '{}' configured successfully", args.name),
            };
            formatter.report(&output, |f| {
                let name = f.paint(Tone::Name, &args.name);
                vec![f.done(&format!("Profile '{name}' configured successfully."))]
            });
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::GeneralError
        }
    }
}

fn execute_list(args: ListArgs, manager: &ConfigManager, formatter: &Formatter) -> ExitCode {
    let config = match manager.load() {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::GeneralError;
        }
    };

    let output = ProfileListOutput {
        profiles: config.profiles.iter().map(ProfileInfo::new).collect(),
    };
    formatter.report(&output, |f| list_lines(&output.profiles, args.long, f));
    ExitCode::Success
}

fn list_lines(profiles: &[ProfileInfo], long: bool, f: &Formatter) -> Vec<String> {
    if profiles.is_empty() {
        return vec!["No profiles configured.".to_string()];
    }
    profiles
        .iter()
        .map(|info| {
            let name = f.paint(Tone::Name, &format!("{:<12}", info.name));
            let summary = format!("{} ({}, {})", info.account, info.backend, info.auth);
            let details = f.paint(Tone::Dim, &summary);
            if long {
                let url = f.paint(Tone::Url, &info.blob_endpoint);
                format!("{name} {details} {url}")
            } else {
                format!("{name} {details}")
            }
        })
        .collect()
}

fn execute_remove(args: RemoveArgs, manager: &ConfigManager, formatter: &Formatter) -> ExitCode {
    let result = manager.load().and_then(|mut config| {
        config.remove(&args.name)?;
        manager.save(&config)
    });

    match result {
        Ok(()) => {
            let output = ProfileOperationOutput {
                success: true,
                profile: args.name.clone(),
                message: format!("Profile '{}' removed", args.name),
            };
            formatter.report(&output, |f| {
                vec![f.done(&format!("Profile '{}' removed.", args.name))]
            });
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str) -> ProfileInfo {
        ProfileInfo {
            name: name.to_string(),
            account: "acct".to_string(),
            backend: "azure".to_string(),
            auth: "sas".to_string(),
            blob_endpoint: "https://acct.blob.core.windows.net/".to_string(),
        }
    }

    fn plain() -> Formatter {
        Formatter::new(OutputConfig {
            no_color: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_list_lines_empty() {
        assert_eq!(list_lines(&[], false, &plain()), ["No profiles configured."]);
    }

    #[test]
    fn test_list_lines_long_shows_endpoint() {
        let profiles = [info("prod")];
        assert_eq!(
            list_lines(&profiles, false, &plain()),
            ["prod         acct (azure, sas)"]
        );
        assert_eq!(
            list_lines(&profiles, true, &plain()),
            ["prod         acct (azure, sas) https://acct.blob.core.windows.net/"]
        );
    }
}
