use crate::types::{CandidateRecord, CanonicalProfile, Field, FieldValue, Quality, StudentStatus};
use interfaces::defs::normalize_identifier;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

/// Result of one merge pass.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub profiles: Vec<CanonicalProfile>,
    /// Records dropped because they carried no identifier.
    pub discarded: usize,
    /// Accepted records that landed in an existing profile.
    pub merged: usize,
}

/// Merges candidate records that share any identifier into canonical profiles.
///
/// Identifiers are linked transitively: a record carrying identifiers of two
/// existing profiles joins them into one. The identifier index lives only for
/// the duration of a single `merge` call.
pub struct Deduplicator;

impl Deduplicator {
    pub fn merge(records: impl IntoIterator<Item = CandidateRecord>) -> Vec<CanonicalProfile> {
        Self::merge_with_stats(records).profiles
    }

    pub fn merge_with_stats(records: impl IntoIterator<Item = CandidateRecord>) -> MergeOutcome {
        let mut state = MergeState::default();
        let mut accepted = 0usize;
        let mut discarded = 0usize;

        for (arrival, mut record) in records.into_iter().enumerate() {
            record.identifiers = record
                .identifiers
                .iter()
                .map(|id| normalize_identifier(id))
                .filter(|id| !id.is_empty())
                .collect();
            if record.identifiers.is_empty() {
                discarded += 1;
                debug!("Discarding record from {} without identifiers", record.source);
                continue;
            }
            accepted += 1;
            state.absorb(arrival, record);
        }

        let profiles: Vec<CanonicalProfile> = state.slots.into_iter().flatten().collect();
        let merged = accepted - profiles.len();
        info!(
            "Merged {} records into {} profiles ({} duplicates, {} discarded)",
            accepted,
            profiles.len(),
            merged,
            discarded
        );

        MergeOutcome {
            profiles,
            discarded,
            merged,
        }
    }
}

#[derive(Default)]
struct MergeState {
    // Slots are created in arrival order; merged-away slots become None.
    slots: Vec<Option<CanonicalProfile>>,
    index: HashMap<String, usize>,
}

impl MergeState {
    fn absorb(&mut self, arrival: usize, record: CandidateRecord) {
        let matched: BTreeSet<usize> = record
            .identifiers
            .iter()
            .filter_map(|id| self.index.get(id).copied())
            .collect();

        let target = match matched.first() {
            Some(&lowest) => lowest,
            None => {
                self.slots.push(Some(seed_profile(arrival, &record)));
                self.slots.len() - 1
            }
        };

        // Later slots referenced by the same record fold into the earliest one
        for &other in matched.iter().filter(|&&slot| slot != target) {
            let Some(absorbed) = self.slots[other].take() else {
                continue;
            };
            debug!("Linking profile slot {} into slot {}", other, target);
            for id in &absorbed.identifiers {
                self.index.insert(id.clone(), target);
            }
            if let Some(profile) = self.slots[target].as_mut() {
                merge_profile(profile, absorbed);
            }
        }

        for id in &record.identifiers {
            self.index.insert(id.clone(), target);
        }
        if !matched.is_empty() {
            if let Some(profile) = self.slots[target].as_mut() {
                merge_record(profile, arrival, record);
            }
        }
    }
}

fn seed_profile(arrival: usize, record: &CandidateRecord) -> CanonicalProfile {
    let fields: BTreeMap<Field, FieldValue> = record
        .fields
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(field, value)| (*field, value.clone()))
        .collect();
    let field_quality = fields.keys().map(|field| (*field, record.quality)).collect();
    let field_arrival = fields.keys().map(|field| (*field, arrival)).collect();

    CanonicalProfile {
        identifiers: record.identifiers.clone(),
        fields,
        contributing_sources: vec![record.source],
        status: StudentStatus::Unknown,
        quality: record.quality,
        field_quality,
        field_arrival,
        first_arrival: arrival,
    }
}

/// Higher quality wins; on a tie the value from the later record wins; empty
/// values never replace anything.
fn merge_field(profile: &mut CanonicalProfile, field: Field, value: FieldValue, quality: Quality, arrival: usize) {
    if value.is_empty() {
        return;
    }
    let keep_existing = match profile.fields.get(&field) {
        Some(existing) if !existing.is_empty() => {
            let existing_quality = profile.field_quality.get(&field).copied().unwrap_or(profile.quality);
            let existing_arrival = profile.field_arrival.get(&field).copied().unwrap_or(profile.first_arrival);
            (existing_quality, existing_arrival) > (quality, arrival)
        }
        _ => false,
    };
    if !keep_existing {
        profile.fields.insert(field, value);
        profile.field_quality.insert(field, quality);
        profile.field_arrival.insert(field, arrival);
    }
}

fn merge_record(profile: &mut CanonicalProfile, arrival: usize, record: CandidateRecord) {
    profile.identifiers.extend(record.identifiers);
    for (field, value) in record.fields {
        merge_field(profile, field, value, record.quality, arrival);
    }
    if !profile.contributing_sources.contains(&record.source) {
        profile.contributing_sources.push(record.source);
    }
    profile.quality = profile.quality.max(record.quality);
}

fn merge_profile(profile: &mut CanonicalProfile, absorbed: CanonicalProfile) {
    profile.identifiers.extend(absorbed.identifiers);
    for (field, value) in absorbed.fields {
        let quality = absorbed.field_quality.get(&field).copied().unwrap_or(absorbed.quality);
        let arrival = absorbed.field_arrival.get(&field).copied().unwrap_or(absorbed.first_arrival);
        merge_field(profile, field, value, quality, arrival);
    }
    for source in absorbed.contributing_sources {
        if !profile.contributing_sources.contains(&source) {
            profile.contributing_sources.push(source);
        }
    }
    profile.quality = profile.quality.max(absorbed.quality);
    profile.first_arrival = profile.first_arrival.min(absorbed.first_arrival);
}
