//! Precedence-ordered merge of source datasets into the registry.
//!
//! Each admission step is a function from the previous [`ConflationState`]
//! to the next one. Steps run strictly in [`AdmissionStep::ORDER`]; a plant
//! admitted by an earlier step is never revisited.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::concordance::Concordance;
use crate::config::ConflateConfig;
use crate::country::{CountryInfo, CountryPolicy, CountryReference};
use crate::error::ConflateError;
use crate::id::PlantId;
use crate::model::{AdmissionStep, CoordinateSource, Dataset, PlantRecord, SourceRole};
use crate::registry::{AuditLog, Registry};
use crate::summary::{compute_summary, ConflateSummary};

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Pre-loaded datasets for one run.
#[derive(Debug, Clone)]
pub struct ConflateInput {
    /// Authoritative datasets keyed by canonical country name.
    pub national: BTreeMap<String, Dataset>,
    pub global: Dataset,
    pub geolocation: Dataset,
    pub carbon: Dataset,
    pub wiki: Dataset,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConflateMeta {
    pub config_name: String,
    pub minimum_capacity_mw: f64,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug)]
pub struct ConflateResult {
    pub meta: ConflateMeta,
    pub summary: ConflateSummary,
    pub registry: Registry,
    pub audit: AuditLog,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Read-only inputs shared by every step.
pub struct StepContext<'a> {
    minimum_capacity_mw: f64,
    global_label: String,
    geolocation_label: String,
    carbon_label: String,
    wiki_label: String,
    countries: &'a CountryReference,
    concordance: &'a Concordance,
    input: &'a ConflateInput,
}

impl<'a> StepContext<'a> {
    pub fn new(
        config: &ConflateConfig,
        countries: &'a CountryReference,
        concordance: &'a Concordance,
        input: &'a ConflateInput,
    ) -> Self {
        Self {
            minimum_capacity_mw: config.minimum_capacity_mw,
            global_label: config.sources.global.label.clone(),
            geolocation_label: config.sources.geolocation.label.clone(),
            carbon_label: config.sources.carbon.label.clone(),
            wiki_label: config.sources.wiki.label.clone(),
            countries,
            concordance,
            input,
        }
    }

    fn country(&self, plant: &PlantRecord) -> Option<&'a CountryInfo> {
        plant.country.as_deref().and_then(|name| self.countries.get(name))
    }

    /// Global plants still waiting for a location: global-policy country,
    /// capacity at or above the threshold, not yet admitted.
    fn pending_global(&self, registry: &Registry) -> Vec<&'a PlantRecord> {
        self.input
            .global
            .iter()
            .filter(|p| self.country(p).map(CountryInfo::policy) == Some(CountryPolicy::Global))
            .filter(|p| p.meets_capacity(self.minimum_capacity_mw))
            .filter(|p| !registry.contains(&p.id))
            .collect()
    }
}

fn dataset_tag(label: &str) -> CoordinateSource {
    CoordinateSource::Dataset {
        label: label.to_string(),
    }
}

/// State threaded through the steps.
#[derive(Debug, Default)]
pub struct ConflationState {
    registry: Registry,
    audit: AuditLog,
    /// Carbon-tracker id → global id that borrowed its location.
    consumed_carbon: BTreeMap<PlantId, PlantId>,
}

impl ConflationState {
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn consumed_carbon(&self) -> &BTreeMap<PlantId, PlantId> {
        &self.consumed_carbon
    }
}

/// Run the full precedence pipeline. Returns registry, labeled audit log and summary.
pub fn run(
    config: &ConflateConfig,
    countries: &CountryReference,
    concordance: &Concordance,
    input: &ConflateInput,
) -> Result<ConflateResult, ConflateError> {
    check_input(config, countries, concordance, input)?;

    let ctx = StepContext::new(config, countries, concordance, input);
    let mut state = ConflationState::default();
    for step in AdmissionStep::ORDER {
        let before = state.registry.len();
        state = apply_step(step, state, &ctx);
        info!(%step, added = state.registry.len() - before, "admission step complete");
    }

    let ConflationState {
        registry,
        audit,
        consumed_carbon,
    } = state;
    let audit = audit.label(&registry, &consumed_carbon);
    let summary = compute_summary(&registry, &audit);

    Ok(ConflateResult {
        meta: ConflateMeta {
            config_name: config.name.clone(),
            minimum_capacity_mw: config.minimum_capacity_mw,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        registry,
        audit,
    })
}

/// Apply one admission step.
pub fn apply_step(step: AdmissionStep, state: ConflationState, ctx: &StepContext<'_>) -> ConflationState {
    match step {
        AdmissionStep::National => admit_national(state, ctx),
        AdmissionStep::GlobalDirect => admit_global_direct(state, ctx),
        AdmissionStep::GlobalViaGeolocation => admit_global_via_geolocation(state, ctx),
        AdmissionStep::GlobalViaCarbon => admit_global_via_carbon(state, ctx),
        AdmissionStep::GeolocationPrimary => admit_geolocation_primary(state, ctx),
        AdmissionStep::Wiki => admit_wiki(state, ctx),
    }
}

/// Dataset codes must match the concordance. National datasets must belong
/// to countries flagged as having one and must not reuse a source code.
fn check_input(
    config: &ConflateConfig,
    countries: &CountryReference,
    concordance: &Concordance,
    input: &ConflateInput,
) -> Result<(), ConflateError> {
    let codes = concordance.codes();
    let wiki = config.wiki_code()?;
    let expected = [
        ("global", &input.global, &codes.global),
        ("geolocation", &input.geolocation, &codes.geolocation),
        ("carbon", &input.carbon, &codes.carbon),
        ("wiki", &input.wiki, &wiki),
    ];
    for (role, dataset, code) in expected {
        if dataset.code() != code {
            return Err(ConflateError::ConfigValidation(format!(
                "{role} dataset has code '{}', expected '{code}'",
                dataset.code()
            )));
        }
    }

    let sources = [&codes.global, &codes.geolocation, &codes.carbon, &codes.fourth, &wiki];
    for (country, dataset) in &input.national {
        if sources.contains(&dataset.code()) {
            return Err(ConflateError::ConfigValidation(format!(
                "national dataset for '{country}' uses code '{}', which belongs to an aggregator source",
                dataset.code()
            )));
        }
        match countries.get(country) {
            Some(info) if info.has_national_source => {}
            Some(_) => {
                return Err(ConflateError::ConfigValidation(format!(
                    "national dataset supplied for '{country}', which is not flagged as having one"
                )))
            }
            None => {
                return Err(ConflateError::ConfigValidation(format!(
                    "national dataset supplied for unknown country '{country}'"
                )))
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

fn admit_national(mut state: ConflationState, ctx: &StepContext<'_>) -> ConflationState {
    for (country, dataset) in &ctx.input.national {
        let tag = CoordinateSource::National {
            country: country.clone(),
        };
        for plant in dataset.iter() {
            let mut candidate = plant.clone();
            candidate.set_coordinate_source(tag.clone());
            state.audit.record(&candidate, SourceRole::National);

            if !plant.meets_capacity(ctx.minimum_capacity_mw) || !plant.location.is_present() {
                debug!(id = %plant.id, %country, "national plant excluded: capacity or location");
                continue;
            }
            state.registry.admit(candidate, tag.clone(), AdmissionStep::National);
        }
    }
    state
}

fn admit_global_direct(mut state: ConflationState, ctx: &StepContext<'_>) -> ConflationState {
    for plant in ctx.input.global.iter() {
        state.audit.record(plant, SourceRole::Global);

        match ctx.country(plant).map(CountryInfo::policy) {
            Some(CountryPolicy::Global) => {}
            Some(policy) => {
                debug!(id = %plant.id, ?policy, "global plant shadowed by country policy");
                continue;
            }
            None => {
                warn!(id = %plant.id, country = ?plant.country, "global plant has an unrecognized country");
                continue;
            }
        }
        if !plant.meets_capacity(ctx.minimum_capacity_mw) || !plant.location.is_present() {
            continue;
        }
        admit_logged(&mut state.registry, plant.clone(), dataset_tag(&ctx.global_label), AdmissionStep::GlobalDirect);
    }
    state
}

fn admit_global_via_geolocation(mut state: ConflationState, ctx: &StepContext<'_>) -> ConflationState {
    for plant in ctx.pending_global(&state.registry) {
        let links = ctx.concordance.resolve(&plant.id);
        let Some(linked) = follow(&plant.id, links.geolocation.as_ref(), &ctx.input.geolocation) else {
            continue;
        };
        if !linked.location.is_present() {
            continue;
        }
        let mut admitted = plant.clone();
        admitted.location = linked.location.clone();
        admit_logged(
            &mut state.registry,
            admitted,
            dataset_tag(&ctx.geolocation_label),
            AdmissionStep::GlobalViaGeolocation,
        );
    }
    state
}

fn admit_global_via_carbon(mut state: ConflationState, ctx: &StepContext<'_>) -> ConflationState {
    for plant in ctx.pending_global(&state.registry) {
        let links = ctx.concordance.resolve(&plant.id);
        let Some(linked) = follow(&plant.id, links.carbon.as_ref(), &ctx.input.carbon) else {
            continue;
        };
        if !linked.location.is_present() {
            continue;
        }
        let mut admitted = plant.clone();
        admitted.location = linked.location.clone();
        if admit_logged(
            &mut state.registry,
            admitted,
            dataset_tag(&ctx.carbon_label),
            AdmissionStep::GlobalViaCarbon,
        ) {
            state.consumed_carbon.insert(linked.id.clone(), plant.id.clone());
        }
    }

    for plant in ctx.input.carbon.iter() {
        let mut candidate = plant.clone();
        candidate.set_coordinate_source(dataset_tag(&ctx.carbon_label));
        state.audit.record(&candidate, SourceRole::Carbon);
    }
    state
}

fn admit_geolocation_primary(mut state: ConflationState, ctx: &StepContext<'_>) -> ConflationState {
    for plant in ctx.input.geolocation.iter() {
        state.audit.record(plant, SourceRole::Geolocation);

        let Some(country) = ctx.country(plant) else {
            warn!(id = %plant.id, country = ?plant.country, "geolocation plant has an unrecognized country");
            continue;
        };
        if !country.use_geolocation_source || !plant.location.is_present() {
            continue;
        }
        admit_logged(
            &mut state.registry,
            plant.clone(),
            dataset_tag(&ctx.geolocation_label),
            AdmissionStep::GeolocationPrimary,
        );
    }
    state
}

fn admit_wiki(mut state: ConflationState, ctx: &StepContext<'_>) -> ConflationState {
    for plant in ctx.input.wiki.iter() {
        state.audit.record(plant, SourceRole::Wiki);
        if plant.location.is_present() {
            admit_logged(&mut state.registry, plant.clone(), dataset_tag(&ctx.wiki_label), AdmissionStep::Wiki);
        }
    }
    state
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn admit_logged(registry: &mut Registry, record: PlantRecord, tag: CoordinateSource, step: AdmissionStep) -> bool {
    let id = record.id.clone();
    let admitted = registry.admit(record, tag, step);
    if admitted {
        debug!(%id, %step, "admitted");
    } else {
        debug!(%id, %step, "already admitted by an earlier step");
    }
    admitted
}

/// Follow a concordance link. A link to a record missing from the target
/// dataset counts as no link.
fn follow<'d>(from: &PlantId, link: Option<&PlantId>, target: &'d Dataset) -> Option<&'d PlantRecord> {
    let id = link?;
    let found = target.get(id);
    if found.is_none() {
        warn!(plant = %from, link = %id, "concordance link points to a missing record, treating as unlinked");
    }
    found
}
