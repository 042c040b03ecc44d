use std::fs;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(author, version, about = "Workspace maintenance tasks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the core and application rings do not depend on adapters.
    CheckArchitecture,
}

/// (directory, forbidden needle) pairs. Inner rings may not name outer ones.
const LAYER_RULES: &[(&str, &str)] = &[
    ("src/core", "crate::adapters"),
    ("src/core", "crate::application"),
    ("src/application", "crate::adapters"),
];

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::CheckArchitecture => check_architecture(),
    }
}

fn check_architecture() -> Result<()> {
    let mut violations = Vec::new();
    for (dir, needle) in LAYER_RULES {
        violations.extend(find_pattern(dir, needle)?);
    }

    if violations.is_empty() {
        println!("architecture check passed");
        Ok(())
    } else {
        Err(anyhow!(
            "Layering violations found:\n  {}",
            violations.join("\n  ")
        ))
    }
}

fn find_pattern(dir: &str, needle: &str) -> Result<Vec<String>> {
    let mut offenders = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                offenders.push(format!("{dir} (walk error: {e})"));
                continue;
            }
        };
        if !entry.file_type().is_file()
            || entry.path().extension().and_then(|ext| ext.to_str()) != Some("rs")
        {
            continue;
        }
        let content = fs::read_to_string(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        if content.contains(needle) {
            offenders.push(format!("{} references '{needle}'", entry.path().display()));
        }
    }
    Ok(offenders)
}
