use std::collections::BTreeMap;

use serde::Serialize;

use crate::registry::{AuditLog, Registry};

#[derive(Debug, Clone, Serialize)]
pub struct ConflateSummary {
    pub total_plants: usize,
    /// Registry plants with any reported generation figure.
    pub with_generation: usize,
    pub candidates: usize,
    pub excluded: usize,
    pub consumed_carbon: usize,
    pub by_step: BTreeMap<String, usize>,
    pub by_coordinate_source: BTreeMap<String, usize>,
}

/// Compute summary statistics over a finished registry and its labeled audit log.
pub fn compute_summary(registry: &Registry, audit: &AuditLog) -> ConflateSummary {
    let mut by_step: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_coordinate_source: BTreeMap<String, usize> = BTreeMap::new();

    for entry in registry.iter() {
        *by_step.entry(entry.admitted_by.to_string()).or_insert(0) += 1;
        if let Some(source) = entry.record.coordinate_source() {
            *by_coordinate_source.entry(source.to_string()).or_insert(0) += 1;
        }
    }

    ConflateSummary {
        total_plants: registry.len(),
        with_generation: registry.count_with_generation(),
        candidates: audit.len(),
        excluded: audit.excluded().count(),
        consumed_carbon: audit.iter().filter(|e| e.consumed_by.is_some()).count(),
        by_step,
        by_coordinate_source,
    }
}
