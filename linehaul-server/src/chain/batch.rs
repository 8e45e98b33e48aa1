//! Batch passes over the legacy route table.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{LegacyRoute, RouteTemplate, TemplateCode, TemplateId};
use crate::store::{Sequence, Store, StoreError, StoreView, UnitOfWork, Write};

use super::reconstruct::{LegInput, OrderingMethod, Reconstruction, ReviewFlag, reconstruct};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    #[error("no legacy route named {0:?}")]
    UnknownRoute(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// One journey after reconstruction, legs in travel order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteChain {
    pub name: String,
    pub legs: Vec<LegacyRoute>,
    pub is_multi_leg: bool,
    pub method: OrderingMethod,
    pub review: Vec<ReviewFlag>,
    /// Rows whose ordering fields changed in this run.
    pub updated: usize,
}

/// Outcome of [`ChainRunner::seed_templates`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeedSummary {
    pub created: Vec<TemplateCode>,
    pub already_present: usize,
    pub without_miles: usize,
    pub unprocessed: usize,
    pub invalid_code: usize,
}

/// Writes reconstruction results back to the legacy table and seeds route
/// templates from them.
pub struct ChainRunner<S> {
    store: Arc<S>,
}

impl<S: Store> ChainRunner<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Reconstruct one journey and store its leg order, day offsets and
    /// multi-leg flag. Rows that already hold the computed values are not
    /// rewritten, so a second run commits nothing.
    pub fn reconstruct_route(&self, name: &str) -> Result<RouteChain, ChainError> {
        let chain = self.store.transaction(|view| {
            let rows = view.legacy_routes_named(name);
            if rows.is_empty() {
                return Err(ChainError::UnknownRoute(name.to_string()));
            }
            let inputs: Vec<LegInput> = rows.iter().map(|row| LegInput::from(*row)).collect();
            let result = reconstruct(name, &inputs);
            let mut work = UnitOfWork::new();
            let chain = apply(name, &rows, result, &mut work);
            Ok((chain, work))
        })?;

        report(&chain);
        Ok(chain)
    }

    /// Reconstruct every journey name in the table.
    pub fn reconstruct_all(&self) -> Result<Vec<RouteChain>, ChainError> {
        let names = self.store.read(|view| view.legacy_route_names())?;
        let chains = names
            .iter()
            .map(|name| self.reconstruct_route(name))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            routes = chains.len(),
            multi_leg = chains.iter().filter(|c| c.is_multi_leg).count(),
            flagged = chains.iter().filter(|c| !c.review.is_empty()).count(),
            updated = chains.iter().map(|c| c.updated).sum::<usize>(),
            "legacy routes reconstructed"
        );
        Ok(chains)
    }

    /// Create a route template for each processed legacy leg with a
    /// mileage. Single-leg journeys use the name as the code, multi-leg
    /// journeys append `-{leg_order}`. Existing codes are left alone.
    pub fn seed_templates(&self) -> Result<SeedSummary, ChainError> {
        let summary = self.store.transaction(|view| {
            let mut summary = SeedSummary::default();
            let mut work = UnitOfWork::new();
            let mut seen: HashSet<TemplateCode> = HashSet::new();

            for name in view.legacy_route_names() {
                for row in view.legacy_routes_named(&name) {
                    if let Some(template) = seed_row(view, row, &mut seen, &mut summary) {
                        summary.created.push(template.code.clone());
                        work.push(Write::InsertTemplate(template));
                    }
                }
            }
            Ok::<_, ChainError>((summary, work))
        })?;

        info!(
            created = summary.created.len(),
            already_present = summary.already_present,
            without_miles = summary.without_miles,
            unprocessed = summary.unprocessed,
            invalid_code = summary.invalid_code,
            "route templates seeded"
        );
        Ok(summary)
    }
}

/// Copy the computed ordering onto the rows and queue writes for any that
/// changed.
fn apply(
    name: &str,
    rows: &[&LegacyRoute],
    result: Reconstruction,
    work: &mut UnitOfWork,
) -> RouteChain {
    let mut legs = Vec::with_capacity(result.legs.len());
    let mut updated = 0;

    for ordered in &result.legs {
        let Some(row) = rows.iter().find(|row| row.id == ordered.id) else {
            continue;
        };
        let mut leg = (*row).clone();
        leg.leg_order = Some(ordered.leg_order);
        leg.day_offset = Some(ordered.day_offset);
        leg.is_multi_leg = Some(result.is_multi_leg);

        if leg != **row {
            updated += 1;
            work.push(Write::UpdateLegacyRoute(leg.clone()));
        }
        legs.push(leg);
    }

    RouteChain {
        name: name.to_string(),
        legs,
        is_multi_leg: result.is_multi_leg,
        method: result.method,
        review: result.review,
        updated,
    }
}

fn report(chain: &RouteChain) {
    for reason in &chain.review {
        warn!(
            route = %chain.name,
            legs = chain.legs.len(),
            method = ?chain.method,
            %reason,
            "route needs review"
        );
    }
    debug!(
        route = %chain.name,
        legs = chain.legs.len(),
        updated = chain.updated,
        "route reconstructed"
    );
}

fn seed_row(
    view: &dyn StoreView,
    row: &LegacyRoute,
    seen: &mut HashSet<TemplateCode>,
    summary: &mut SeedSummary,
) -> Option<RouteTemplate> {
    let (Some(leg_order), Some(is_multi_leg)) = (row.leg_order, row.is_multi_leg) else {
        summary.unprocessed += 1;
        return None;
    };
    let Some(miles) = row.miles else {
        summary.without_miles += 1;
        return None;
    };

    let raw = if is_multi_leg {
        format!("{}-{}", row.name, leg_order)
    } else {
        row.name.clone()
    };
    let code = match TemplateCode::parse_normalized(&raw) {
        Ok(code) => code,
        Err(e) => {
            warn!(
                route = %row.name,
                code = %raw,
                error = %e,
                "legacy route name is not a valid template code"
            );
            summary.invalid_code += 1;
            return None;
        }
    };
    if view.template_by_code(&code).is_some() || !seen.insert(code.clone()) {
        summary.already_present += 1;
        return None;
    }

    Some(RouteTemplate {
        id: TemplateId(view.next_id(Sequence::Template)),
        code,
        origin: row.origin,
        destination: row.destination,
        departure: row.departure,
        arrival: row.arrival,
        distance_miles: Some(miles),
        transit_minutes: None,
        active: row.active,
    })
}
