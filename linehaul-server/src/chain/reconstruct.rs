//! Leg ordering for legacy routes recorded as unordered segments.
//!
//! Nothing here touches storage. The input is every row sharing one journey
//! name, the output is a leg order, a day offset per leg and a list of reasons
//! a person should look at the result before trusting it.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::domain::{LegacyRoute, LegacyRouteId, TerminalCode, TimeOfDay, letter_prefix};

/// The fields of a legacy row that ordering looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegInput {
    pub id: LegacyRouteId,
    pub origin: TerminalCode,
    pub destination: TerminalCode,
    pub departure: Option<TimeOfDay>,
    pub arrival: Option<TimeOfDay>,
}

impl From<&LegacyRoute> for LegInput {
    fn from(row: &LegacyRoute) -> Self {
        Self {
            id: row.id,
            origin: row.origin,
            destination: row.destination,
            departure: row.departure,
            arrival: row.arrival,
        }
    }
}

/// A leg's place in the reconstructed journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderedLeg {
    pub id: LegacyRouteId,
    /// 1-based.
    pub leg_order: u32,
    pub day_offset: u32,
}

/// How the order was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingMethod {
    SingleLeg,
    /// Walked origin to destination from the chain root.
    Chain,
    /// No root could be found; rows are sorted by departure time.
    DepartureTime,
}

/// Why a reconstruction needs a human to check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewFlag {
    /// Several terminals only appear as origins and the name matched none.
    AmbiguousRoot,
    /// Every origin is also a destination.
    NoRoot,
    /// Some rows were not reachable from the root.
    DisconnectedLegs,
    MissingDeparture,
    /// A leg crossed midnight but the next one did not move to a later day.
    UncountedMidnight,
}

impl fmt::Display for ReviewFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReviewFlag::AmbiguousRoot => "ambiguous starting terminal",
            ReviewFlag::NoRoot => "no starting terminal",
            ReviewFlag::DisconnectedLegs => "disconnected legs",
            ReviewFlag::MissingDeparture => "missing departure time",
            ReviewFlag::UncountedMidnight => "midnight crossing without a day change",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconstruction {
    pub legs: Vec<OrderedLeg>,
    pub is_multi_leg: bool,
    pub method: OrderingMethod,
    pub review: Vec<ReviewFlag>,
}

impl Reconstruction {
    pub fn needs_review(&self) -> bool {
        !self.review.is_empty()
    }

    /// Position of `id` in the result, if present.
    pub fn leg(&self, id: LegacyRouteId) -> Option<&OrderedLeg> {
        self.legs.iter().find(|leg| leg.id == id)
    }
}

/// Order the legs of the journey `name`.
///
/// A single row is leg 1 on day 0. Otherwise the walk starts from the
/// terminal that is never a destination, prefers an evening departure for
/// the first hop and the earliest departure after that. Rows the walk cannot
/// reach are appended by departure time.
pub fn reconstruct(name: &str, legs: &[LegInput]) -> Reconstruction {
    match legs {
        [] => {
            return Reconstruction {
                legs: Vec::new(),
                is_multi_leg: false,
                method: OrderingMethod::SingleLeg,
                review: Vec::new(),
            };
        }
        [only] => {
            return Reconstruction {
                legs: vec![OrderedLeg {
                    id: only.id,
                    leg_order: 1,
                    day_offset: 0,
                }],
                is_multi_leg: false,
                method: OrderingMethod::SingleLeg,
                review: Vec::new(),
            };
        }
        _ => {}
    }

    let mut review = Vec::new();
    let (order, method) = match find_root(name, legs, &mut review) {
        Some(root) => (walk(legs, root, &mut review), OrderingMethod::Chain),
        None => {
            flag(&mut review, ReviewFlag::NoRoot);
            let all = (0..legs.len()).collect();
            (by_departure(legs, all), OrderingMethod::DepartureTime)
        }
    };

    if legs.iter().any(|leg| leg.departure.is_none()) {
        flag(&mut review, ReviewFlag::MissingDeparture);
    }

    let ordered: Vec<&LegInput> = order.iter().map(|&i| &legs[i]).collect();
    let offsets = day_offsets(&ordered, &mut review);

    Reconstruction {
        legs: ordered
            .iter()
            .zip(offsets)
            .zip(1u32..)
            .map(|((leg, day_offset), leg_order)| OrderedLeg {
                id: leg.id,
                leg_order,
                day_offset,
            })
            .collect(),
        is_multi_leg: true,
        method,
        review,
    }
}

fn flag(review: &mut Vec<ReviewFlag>, reason: ReviewFlag) {
    if !review.contains(&reason) {
        review.push(reason);
    }
}

/// Consecutive three-letter chunks of the name's leading letters.
fn name_tokens(name: &str) -> Vec<String> {
    let prefix = letter_prefix(name.trim()).to_ascii_uppercase();
    (0..prefix.len() / 3)
        .filter_map(|i| prefix.get(i * 3..i * 3 + 3))
        .map(str::to_string)
        .collect()
}

fn find_root(name: &str, legs: &[LegInput], review: &mut Vec<ReviewFlag>) -> Option<TerminalCode> {
    let destinations: HashSet<TerminalCode> = legs.iter().map(|leg| leg.destination).collect();
    let mut roots: Vec<TerminalCode> = Vec::new();
    for leg in legs {
        if !destinations.contains(&leg.origin) && !roots.contains(&leg.origin) {
            roots.push(leg.origin);
        }
    }

    match roots.as_slice() {
        [] => None,
        [root] => Some(*root),
        _ => {
            let named = name_tokens(name)
                .into_iter()
                .find_map(|token| roots.iter().copied().find(|r| r.as_str() == token));
            if named.is_some() {
                return named;
            }
            flag(review, ReviewFlag::AmbiguousRoot);
            roots.iter().copied().min_by_key(|root| {
                legs.iter()
                    .filter(|leg| leg.origin == *root)
                    .map(departure_key)
                    .min()
            })
        }
    }
}

fn walk(legs: &[LegInput], root: TerminalCode, review: &mut Vec<ReviewFlag>) -> Vec<usize> {
    let mut used = vec![false; legs.len()];
    let mut order = Vec::with_capacity(legs.len());
    let mut current = root;

    loop {
        let candidates: Vec<usize> = (0..legs.len())
            .filter(|&i| !used[i] && legs[i].origin == current)
            .collect();
        let next = if order.is_empty() {
            first_hop(legs, &candidates)
        } else {
            earliest(legs, &candidates)
        };
        let Some(i) = next else { break };
        used[i] = true;
        order.push(i);
        current = legs[i].destination;
    }

    let rest: Vec<usize> = (0..legs.len()).filter(|&i| !used[i]).collect();
    if !rest.is_empty() {
        flag(review, ReviewFlag::DisconnectedLegs);
        order.extend(by_departure(legs, rest));
    }
    order
}

fn first_hop(legs: &[LegInput], candidates: &[usize]) -> Option<usize> {
    let evening: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&i| legs[i].departure.is_some_and(|d| d.is_evening()))
        .collect();
    earliest(legs, &evening).or_else(|| earliest(legs, candidates))
}

fn earliest(legs: &[LegInput], candidates: &[usize]) -> Option<usize> {
    candidates
        .iter()
        .copied()
        .min_by_key(|&i| departure_key(&legs[i]))
}

fn by_departure(legs: &[LegInput], mut indices: Vec<usize>) -> Vec<usize> {
    indices.sort_by_key(|&i| departure_key(&legs[i]));
    indices
}

/// Known departures first, earliest first.
fn departure_key(leg: &LegInput) -> (bool, Option<TimeOfDay>) {
    (leg.departure.is_none(), leg.departure)
}

/// At most one day is added per leg, whichever rule fires.
fn day_offsets(ordered: &[&LegInput], review: &mut Vec<ReviewFlag>) -> Vec<u32> {
    let mut offsets = Vec::with_capacity(ordered.len());
    let mut day = 0u32;

    for (i, leg) in ordered.iter().enumerate() {
        if let Some(prev) = i.checked_sub(1).map(|p| ordered[p]) {
            let regressed = matches!(
                (prev.departure, leg.departure),
                (Some(p), Some(c)) if p.is_after_noon() && c.is_before_noon()
            );
            let prev_crossed = matches!(
                (prev.departure, prev.arrival),
                (Some(d), Some(a)) if a < d
            );
            let before_prev_arrival = matches!(
                (prev.arrival, leg.departure),
                (Some(a), Some(c)) if c < a
            );

            if regressed || (prev_crossed && before_prev_arrival) {
                day += 1;
            } else if prev_crossed {
                flag(review, ReviewFlag::UncountedMidnight);
            }
        }
        offsets.push(day);
    }
    offsets
}
