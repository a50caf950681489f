//! Facility ranking. Every function here is pure: the same candidates, target
//! and policy always yield the same match.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use responder_core::models::{AmbulanceTier, Coordinate, FacilityCandidate, MatchedFacility};

use crate::geo::haversine_miles;

pub trait SelectionStrategy: Send + Sync {
    fn select(&self, candidates: &[FacilityCandidate], target: Coordinate) -> Option<MatchedFacility>;

    fn name(&self) -> &str;
}

/// Per-service ranking rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Trust the directory's relevance order and take the first result.
    CollaboratorOrder,
    /// Nearest candidate whose capability matches `tier`. When `service_type`
    /// is set the candidate's type must match it too.
    NearestOfTier {
        tier: AmbulanceTier,
        service_type: Option<String>,
    },
    /// Highest rating within `cutoff_miles`, nearest first among equal ratings.
    BestRated { cutoff_miles: f64, default_rating: f64 },
}

impl SelectionPolicy {
    pub fn strategy(&self) -> Box<dyn SelectionStrategy> {
        match self {
            SelectionPolicy::CollaboratorOrder => Box::new(CollaboratorOrderStrategy::new()),
            SelectionPolicy::NearestOfTier { tier, service_type } => {
                Box::new(NearestOfTierStrategy::new(*tier, service_type.clone()))
            }
            SelectionPolicy::BestRated {
                cutoff_miles,
                default_rating,
            } => Box::new(BestRatedStrategy::new(*cutoff_miles, *default_rating)),
        }
    }
}

pub fn select(
    candidates: &[FacilityCandidate],
    target: Coordinate,
    policy: &SelectionPolicy,
) -> Option<MatchedFacility> {
    policy.strategy().select(candidates, target)
}

pub struct CollaboratorOrderStrategy;

impl CollaboratorOrderStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CollaboratorOrderStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionStrategy for CollaboratorOrderStrategy {
    fn select(&self, candidates: &[FacilityCandidate], target: Coordinate) -> Option<MatchedFacility> {
        let first = candidates.first()?;
        let distance = haversine_miles(target, first.location);
        debug!(
            facility = %first.name,
            distance_miles = ?distance,
            "taking first directory result"
        );
        Some(MatchedFacility::from_candidate(first, distance))
    }

    fn name(&self) -> &str {
        "CollaboratorOrder"
    }
}

pub struct NearestOfTierStrategy {
    tier: AmbulanceTier,
    service_type: Option<String>,
}

impl NearestOfTierStrategy {
    pub fn new(tier: AmbulanceTier, service_type: Option<String>) -> Self {
        Self { tier, service_type }
    }

    fn qualifies(&self, candidate: &FacilityCandidate) -> bool {
        let tier_matches = candidate
            .capability
            .as_deref()
            .is_some_and(|label| self.tier.matches_label(label));
        let type_matches = match &self.service_type {
            Some(wanted) => candidate
                .service_type
                .as_deref()
                .is_some_and(|actual| actual.eq_ignore_ascii_case(wanted)),
            None => true,
        };
        tier_matches && type_matches
    }
}

impl SelectionStrategy for NearestOfTierStrategy {
    fn select(&self, candidates: &[FacilityCandidate], target: Coordinate) -> Option<MatchedFacility> {
        let qualified: Vec<(&FacilityCandidate, Option<f64>)> = candidates
            .iter()
            .filter(|candidate| self.qualifies(candidate))
            .map(|candidate| (candidate, haversine_miles(target, candidate.location)))
            .collect();

        if qualified.is_empty() {
            debug!(tier = %self.tier, "no candidate matches the requested tier");
            return None;
        }

        // Known distances rank first; among unknowns the earliest candidate wins.
        let (best, distance) = qualified
            .iter()
            .min_by(|(_, a), (_, b)| compare_optional_distance(*a, *b))
            .copied()?;

        debug!(
            facility = %best.name,
            tier = %self.tier,
            distance_miles = ?distance,
            "selected nearest tier-matched facility"
        );
        Some(MatchedFacility::from_candidate(best, distance))
    }

    fn name(&self) -> &str {
        "NearestOfTier"
    }
}

pub struct BestRatedStrategy {
    cutoff_miles: f64,
    default_rating: f64,
}

impl BestRatedStrategy {
    pub fn new(cutoff_miles: f64, default_rating: f64) -> Self {
        Self {
            cutoff_miles,
            default_rating,
        }
    }
}

impl SelectionStrategy for BestRatedStrategy {
    fn select(&self, candidates: &[FacilityCandidate], target: Coordinate) -> Option<MatchedFacility> {
        // A candidate whose distance is unknown cannot be shown to be inside the cutoff.
        let in_range: Vec<(&FacilityCandidate, f64, f64)> = candidates
            .iter()
            .filter_map(|candidate| {
                let distance = haversine_miles(target, candidate.location)?;
                (distance <= self.cutoff_miles).then(|| {
                    (
                        candidate,
                        candidate.rating.unwrap_or(self.default_rating),
                        distance,
                    )
                })
            })
            .collect();

        let (best, rating, distance) = in_range.iter().copied().min_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal))
        })?;

        debug!(
            facility = %best.name,
            rating,
            distance_miles = distance,
            considered = in_range.len(),
            "selected best-rated facility"
        );
        // The fallback rating only ranks; the result keeps the directory's value.
        Some(MatchedFacility::from_candidate(best, Some(distance)))
    }

    fn name(&self) -> &str {
        "BestRated"
    }
}

fn compare_optional_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
