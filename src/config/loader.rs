//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::blockchain::types::HexParseError;
use crate::blockchain::wallet::SigningSecret;
use crate::config::schema::{ConnectionProfile, ProfileEntry, ProfilesFile};
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read config file {}: {source}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not a valid YAML mapping.
    #[error("cannot parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The `profiles` section or the requested profile is absent.
    #[error("expected a `{profile}` profile in config: {reason}")]
    ProfileMissing {
        profile: String,
        reason: &'static str,
    },

    /// A required field is absent from the resolved profile.
    #[error("expected `{field}` to be present in `{profile}` profile")]
    FieldMissing {
        profile: String,
        field: &'static str,
    },

    /// A field is present but unusable.
    #[error("invalid `{field}` in `{profile}` profile: {reason}")]
    InvalidField {
        profile: String,
        field: &'static str,
        reason: String,
    },

    /// Client settings were rejected.
    #[error("invalid settings: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Read and parse the profile file.
pub fn load_profiles(path: &Path) -> ConfigResult<ProfilesFile> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;

    // An empty document has no profiles rather than being malformed.
    if content.trim().is_empty() {
        return Ok(ProfilesFile::default());
    }

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve `profile` from the file at `path`.
pub fn resolve_profile(path: &Path, profile: &str) -> ConfigResult<ConnectionProfile> {
    let file = load_profiles(path)?;
    let resolved = select_profile(&file, profile)?;

    tracing::debug!(
        path = %path.display(),
        profile = %resolved.name,
        endpoint = %resolved.endpoint_url,
        "Profile resolved"
    );

    Ok(resolved)
}

/// Pick and validate a profile from an already parsed file.
pub fn select_profile(file: &ProfilesFile, profile: &str) -> ConfigResult<ConnectionProfile> {
    let profiles = file
        .profiles
        .as_ref()
        .ok_or_else(|| ConfigError::ProfileMissing {
            profile: profile.to_string(),
            reason: "config has no `profiles` section",
        })?;

    let entry = profiles
        .get(profile)
        .and_then(Option::as_ref)
        .ok_or_else(|| ConfigError::ProfileMissing {
            profile: profile.to_string(),
            reason: "profile is not defined",
        })?;

    let rest_url = required(entry, profile, "rest_url", |e| e.rest_url.as_deref())?;
    let private_key = required(entry, profile, "private_key", |e| e.private_key.as_deref())?;

    let endpoint_url = Url::parse(rest_url).map_err(|e| ConfigError::InvalidField {
        profile: profile.to_string(),
        field: "rest_url",
        reason: e.to_string(),
    })?;
    let signing_secret =
        SigningSecret::from_hex(private_key).map_err(|e| ConfigError::InvalidField {
            profile: profile.to_string(),
            field: "private_key",
            reason: e.to_string(),
        })?;

    let module_address = entry
        .module_address
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value.parse().map_err(|e: HexParseError| ConfigError::InvalidField {
                profile: profile.to_string(),
                field: "module_address",
                reason: e.to_string(),
            })
        })
        .transpose()?;

    Ok(ConnectionProfile {
        name: profile.to_string(),
        endpoint_url,
        signing_secret,
        module_address,
    })
}

/// Fetch a non-empty string field.
fn required<'a>(
    entry: &'a ProfileEntry,
    profile: &str,
    field: &'static str,
    get: impl Fn(&'a ProfileEntry) -> Option<&'a str>,
) -> ConfigResult<&'a str> {
    get(entry)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::FieldMissing {
            profile: profile.to_string(),
            field,
        })
}
