use crate::types::{CanonicalProfile, ProfileSink, UsageStats};
use crate::utils::slugify;
use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize)]
struct ProfileDocument<'a> {
    institution: &'a str,
    generated_at: String,
    total_profiles: usize,
    usage: &'a UsageStats,
    profiles: &'a [CanonicalProfile],
}

/// Writes each run to `<directory>/<institution-slug>_<timestamp>.json`.
pub struct JsonFileSink {
    directory: PathBuf,
}

impl JsonFileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn file_path(&self, institution: &str, stamp: &str) -> PathBuf {
        let slug = match slugify(institution) {
            s if s.is_empty() => "profiles".to_string(),
            s => s.replace('-', "_"),
        };
        self.directory.join(format!("{}_{}.json", slug, stamp))
    }
}

impl ProfileSink for JsonFileSink {
    fn persist(&self, institution: &str, profiles: &[CanonicalProfile], usage: &UsageStats) -> anyhow::Result<()> {
        fs::create_dir_all(&self.directory)
            .with_context(|| format!("Failed to create output directory {}", self.directory.display()))?;

        let now = Utc::now();
        let path = self.file_path(institution, &now.format("%Y%m%d_%H%M%S").to_string());
        let document = ProfileDocument {
            institution,
            generated_at: now.to_rfc3339(),
            total_profiles: profiles.len(),
            usage,
            profiles,
        };

        let json = serde_json::to_string_pretty(&document)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

        info!("Saved {} profiles to {}", profiles.len(), path.display());
        Ok(())
    }
}
