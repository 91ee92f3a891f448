use anyhow::Result;

use crate::defs::CanonicalProfile;
use crate::defs::UsageStats;

/// Consumer of a finished aggregation run. Implementations own the output
/// encoding (JSON, CSV, database rows); the pipeline has no opinion on it.
pub trait ProfileSink {
    fn persist(&self, institution: &str, profiles: &[CanonicalProfile], usage: &UsageStats) -> Result<()>;
}
