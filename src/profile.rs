//! Named browser profiles, so a manual login survives across runs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::ScrapeError;

const METADATA_FILE: &str = "metadata.json";

/// Metadata about a browser profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

/// Manages Chrome user-data directories under one root
pub struct ProfileManager {
    profiles_dir: PathBuf,
}

impl ProfileManager {
    /// Profiles under `~/.postscrape/profiles`
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Unable to determine home directory")?;
        Self::with_root(home_dir.join(".postscrape").join("profiles"))
    }

    /// Profiles under `profiles_dir`, created if missing
    pub fn with_root(profiles_dir: impl Into<PathBuf>) -> Result<Self> {
        let profiles_dir = profiles_dir.into();
        fs::create_dir_all(&profiles_dir).with_context(|| {
            format!(
                "Failed to create profiles directory {}",
                profiles_dir.display()
            )
        })?;
        Ok(ProfileManager { profiles_dir })
    }

    pub fn profiles_dir(&self) -> &Path {
        &self.profiles_dir
    }

    fn validate_name(name: &str) -> Result<()> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
            && !name.chars().any(char::is_control);
        if !valid {
            return Err(ScrapeError::InvalidInput(format!("Invalid profile name '{}'", name)).into());
        }
        Ok(())
    }

    fn write_metadata(path: &Path, metadata: &ProfileMetadata) -> Result<()> {
        let metadata_json = serde_json::to_string_pretty(metadata)?;
        fs::write(path.join(METADATA_FILE), metadata_json)?;
        Ok(())
    }

    fn read_metadata(path: &Path) -> Result<ProfileMetadata> {
        let metadata_json = fs::read_to_string(path.join(METADATA_FILE))?;
        Ok(serde_json::from_str(&metadata_json)?)
    }

    pub fn create_profile(&self, name: &str) -> Result<PathBuf> {
        Self::validate_name(name)?;
        let profile_path = self.profiles_dir.join(name);

        if profile_path.exists() {
            anyhow::bail!("Profile '{}' already exists", name);
        }

        fs::create_dir_all(&profile_path)?;

        let now = Utc::now();
        Self::write_metadata(
            &profile_path,
            &ProfileMetadata {
                name: name.to_string(),
                created_at: now,
                last_used: now,
            },
        )?;

        info!("Created profile '{}'", name);
        Ok(profile_path)
    }

    pub fn delete_profile(&self, name: &str) -> Result<()> {
        Self::validate_name(name)?;
        let profile_path = self.profiles_dir.join(name);

        if !profile_path.exists() {
            anyhow::bail!("Profile '{}' does not exist", name);
        }

        fs::remove_dir_all(&profile_path)?;
        info!("Deleted profile '{}'", name);
        Ok(())
    }

    /// Profiles, most recently used first
    pub fn list_profiles(&self) -> Result<Vec<ProfileMetadata>> {
        let mut profiles = Vec::new();

        for entry in fs::read_dir(&self.profiles_dir)? {
            let path = entry?.path();
            if path.is_dir() && path.join(METADATA_FILE).exists() {
                match Self::read_metadata(&path) {
                    Ok(metadata) => profiles.push(metadata),
                    Err(e) => debug!("Skipping unreadable profile {}: {}", path.display(), e),
                }
            }
        }

        profiles.sort_by(|a, b| b.last_used.cmp(&a.last_used));
        Ok(profiles)
    }

    /// User-data directory for `name`, created on first use; stamps `last_used`
    pub fn open_profile(&self, name: &str) -> Result<PathBuf> {
        Self::validate_name(name)?;
        let profile_path = self.profiles_dir.join(name);

        if !profile_path.exists() {
            return self.create_profile(name);
        }

        match Self::read_metadata(&profile_path) {
            Ok(mut metadata) => {
                metadata.last_used = Utc::now();
                Self::write_metadata(&profile_path, &metadata)?;
            }
            Err(e) => debug!("Profile '{}' has no readable metadata: {}", name, e),
        }

        debug!("Using profile directory {}", profile_path.display());
        Ok(profile_path)
    }
}
