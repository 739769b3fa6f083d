use clap::Subcommand;
use serde_json::json;
use std::path::PathBuf;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::{self, ConfigError};
use crate::gateway::{RegistryTable, RolePathRegistry};

#[derive(Subcommand)]
pub enum RegistryCommands {
    #[command(about = "Print the role-path registry the server would load")]
    Show,

    #[command(about = "Validate a registry table (defaults to the configured one)")]
    Validate {
        #[arg(long, help = "YAML registry file to validate")]
        file: Option<PathBuf>,
    },
}

pub fn handle(cmd: RegistryCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        RegistryCommands::Show => {
            let registry = config::config().gateway.load_registry()?;
            print_registry(&registry, "Role-path registry", output_format)
        }
        RegistryCommands::Validate { file } => {
            let gateway = &config::config().gateway;
            let table = match file {
                Some(path) => RegistryTable::from_yaml_file(&path),
                None => match &gateway.registry_file {
                    Some(path) => RegistryTable::from_yaml_file(path),
                    None => Ok(RegistryTable::builtin(&gateway.api_root)),
                },
            };

            // Same checks the server runs at startup, including the public prefixes
            let checked = table
                .and_then(RolePathRegistry::build)
                .map_err(ConfigError::from)
                .and_then(|registry| gateway.check_registry(&registry).map(|_| registry));

            match checked {
                Ok(registry) => print_registry(&registry, "Registry is valid", output_format),
                Err(e) => {
                    output_error(output_format, &e.to_string(), json!(null))?;
                    anyhow::bail!("registry validation failed")
                }
            }
        }
    }
}

fn print_registry(registry: &RolePathRegistry, message: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let entries = registry.entries();
    let lines = entries
        .iter()
        .map(|(role, prefixes)| {
            let prefixes: Vec<&str> = prefixes.iter().map(String::as_str).collect();
            format!("{:<15} {}", role.as_str(), prefixes.join(", "))
        })
        .collect::<Vec<_>>();
    let data = json!({
        "api_root": registry.api_root(),
        "namespaces": entries
            .iter()
            .map(|(role, prefixes)| json!({ "role": role, "prefixes": prefixes }))
            .collect::<Vec<_>>(),
    });

    output_success(output_format, message, &lines, data)
}
