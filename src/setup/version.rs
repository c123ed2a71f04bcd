//! Config version tracking.
//!
//! The first line of `clipdeck.toml` records which release wrote it. Comparing
//! it with the running version tells startup whether setup has to run again.

use anyhow::anyhow;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A `major.minor.patch` version.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
struct SemanticVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl SemanticVersion {
    fn parse(version_str: &str) -> anyhow::Result<Self> {
        let parts = version_str
            .trim()
            .split('.')
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| anyhow!("Invalid version component '{part}' in '{version_str}'"))
            })
            .collect::<anyhow::Result<Vec<u32>>>()?;

        match parts.as_slice() {
            [major, minor, patch] => Ok(Self {
                major: *major,
                minor: *minor,
                patch: *patch,
            }),
            _ => Err(anyhow!(
                "Invalid version format: '{version_str}'. Expected 'major.minor.patch'"
            )),
        }
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// What startup has to do about the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupNeed {
    /// No config file yet
    Fresh,
    /// Config written by an older release (or carries no version line)
    Upgrade { from: String },
    /// Config matches this release
    UpToDate,
}

/// Extracts the version from a `config_version = "X.Y.Z"` first line.
fn read_config_version(content: &str) -> anyhow::Result<Option<String>> {
    let Some(first_line) = content.lines().next() else {
        return Ok(None);
    };
    let regex = Regex::new(r#"^\s*config_version\s*=\s*"([^"]+)""#)?;
    Ok(regex
        .captures(first_line)
        .map(|caps| caps[1].to_string()))
}

/// Compares the config file at `config_path` with the running version.
///
/// # Errors
/// - If the file exists but cannot be read
/// - If either version string is malformed
pub fn check_setup_needed(config_path: &Path) -> anyhow::Result<SetupNeed> {
    if !config_path.exists() {
        return Ok(SetupNeed::Fresh);
    }

    let content = std::fs::read_to_string(config_path)?;
    let Some(config_version) = read_config_version(&content)? else {
        return Ok(SetupNeed::Upgrade {
            from: "unknown (no version line)".to_string(),
        });
    };

    let current = SemanticVersion::parse(CURRENT_VERSION)?;
    match SemanticVersion::parse(&config_version)?.cmp(&current) {
        Ordering::Less => Ok(SetupNeed::Upgrade {
            from: config_version,
        }),
        Ordering::Equal => Ok(SetupNeed::UpToDate),
        Ordering::Greater => {
            tracing::warn!(
                "Config version {} is newer than app version {}",
                config_version,
                current
            );
            Ok(SetupNeed::UpToDate)
        }
    }
}

/// Rewrites the first line of the config as the current version, keeping the rest.
///
/// # Errors
/// - If the file cannot be read or written
pub fn update_config_version(config_path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(config_path)?;
    let body: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim_start().starts_with("config_version"))
        .collect();

    let mut updated = format!(r#"config_version = "{CURRENT_VERSION}""#);
    for line in body {
        updated.push('\n');
        updated.push_str(line);
    }
    std::fs::write(config_path, updated)?;
    Ok(())
}
