use std::collections::BTreeMap;

use serde::Serialize;

use crate::id::PlantId;
use crate::model::{AdmissionStep, CoordinateSource, PlantRecord, SourceRole};

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// A plant accepted into the registry and the rule that accepted it.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryEntry {
    pub record: PlantRecord,
    pub admitted_by: AdmissionStep,
}

/// Final id → plant. Write-once per id.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: BTreeMap<PlantId, RegistryEntry>,
}

impl Registry {
    /// Admit a plant under its own id. Returns `false` and leaves the
    /// existing entry untouched when the id is already present.
    pub(crate) fn admit(&mut self, mut record: PlantRecord, source: CoordinateSource, step: AdmissionStep) -> bool {
        if self.entries.contains_key(&record.id) {
            return false;
        }
        record.set_coordinate_source(source);
        self.entries.insert(
            record.id.clone(),
            RegistryEntry {
                record,
                admitted_by: step,
            },
        );
        true
    }

    pub fn get(&self, id: &PlantId) -> Option<&RegistryEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &PlantId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    pub fn records(&self) -> impl Iterator<Item = &PlantRecord> {
        self.entries.values().map(|e| &e.record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plants with any reported generation figure.
    pub fn count_with_generation(&self) -> usize {
        self.records().filter(|r| r.has_generation()).count()
    }
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// Every candidate the pipeline looked at, admitted or not.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub record: PlantRecord,
    pub role: SourceRole,
    pub in_registry: bool,
    /// For carbon-tracker records: the global plant that borrowed its location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_by: Option<PlantId>,
}

#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: BTreeMap<PlantId, AuditEntry>,
}

impl AuditLog {
    /// Keep a copy of a candidate. The first copy of an id wins.
    pub(crate) fn record(&mut self, record: &PlantRecord, role: SourceRole) {
        self.entries.entry(record.id.clone()).or_insert_with(|| AuditEntry {
            record: record.clone(),
            role,
            in_registry: false,
            consumed_by: None,
        });
    }

    /// Labeling pass: flag ids present in the registry (taking the admitted
    /// copy, which carries its coordinate source) and carbon records borrowed
    /// by a global plant.
    pub(crate) fn label(mut self, registry: &Registry, consumed: &BTreeMap<PlantId, PlantId>) -> Self {
        for (id, entry) in self.entries.iter_mut() {
            if let Some(admitted) = registry.get(id) {
                entry.record = admitted.record.clone();
                entry.in_registry = true;
            }
            if let Some(global) = consumed.get(id) {
                entry.consumed_by = Some(global.clone());
            }
        }
        self
    }

    pub fn get(&self, id: &PlantId) -> Option<&AuditEntry> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Candidates left out of the registry.
    pub fn excluded(&self) -> impl Iterator<Item = &AuditEntry> {
        self.iter().filter(|e| !e.in_registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Location;

    fn plant(id: &str) -> PlantRecord {
        let mut p = PlantRecord::new(id.parse().unwrap(), "Plant");
        p.location = Location::new(1.0, 2.0);
        p
    }

    fn tag(label: &str) -> CoordinateSource {
        CoordinateSource::Dataset { label: label.into() }
    }

    #[test]
    fn admit_is_write_once() {
        let mut registry = Registry::default();
        assert!(registry.admit(plant("WRI0000001"), tag("WRI"), AdmissionStep::GlobalDirect));
        assert!(!registry.admit(plant("WRI0000001"), tag("GEO"), AdmissionStep::GlobalViaGeolocation));

        let entry = registry.get(&"WRI0000001".parse().unwrap()).unwrap();
        assert_eq!(entry.admitted_by, AdmissionStep::GlobalDirect);
        assert_eq!(entry.record.coordinate_source().unwrap().to_string(), "WRI data");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn label_marks_registry_and_consumed() {
        let mut registry = Registry::default();
        registry.admit(plant("WRI0000001"), tag("CARMA"), AdmissionStep::GlobalViaCarbon);

        let mut audit = AuditLog::default();
        audit.record(&plant("WRI0000001"), SourceRole::Global);
        audit.record(&plant("WRI0000002"), SourceRole::Global);
        audit.record(&plant("CARMA0000009"), SourceRole::Carbon);

        let consumed = BTreeMap::from([("CARMA0000009".parse().unwrap(), "WRI0000001".parse().unwrap())]);
        let audit = audit.label(&registry, &consumed);

        let admitted = audit.get(&"WRI0000001".parse().unwrap()).unwrap();
        assert!(admitted.in_registry);
        assert!(admitted.record.coordinate_source().is_some());
        assert!(!audit.get(&"WRI0000002".parse().unwrap()).unwrap().in_registry);

        let carbon = audit.get(&"CARMA0000009".parse().unwrap()).unwrap();
        assert!(!carbon.in_registry);
        assert_eq!(carbon.consumed_by.as_ref().unwrap().to_string(), "WRI0000001");
        assert_eq!(audit.excluded().count(), 2);
    }
}
