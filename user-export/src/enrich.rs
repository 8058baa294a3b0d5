//! In-memory join of raw users against the reference mappings.
//!
//! Nothing here touches the network: every mapping must be complete before
//! the first user is enriched.

use crate::model::{EnrichedUser, RawUser};
use crate::reference::{ReferenceMap, ResourceKind};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const NO_DIVISION: &str = "No Division";
pub const UNKNOWN_SKILL: &str = "Unknown Skill";
pub const UNKNOWN_QUEUE: &str = "Unknown Queue";

/// The three mappings a run builds before touching users.
#[derive(Debug, Clone)]
pub struct ReferenceMaps {
    pub divisions: ReferenceMap,
    pub skills: ReferenceMap,
    pub queues: ReferenceMap
}

impl ReferenceMaps {
    pub fn empty() -> Self {
        Self {
            divisions: ReferenceMap::new(ResourceKind::Division),
            skills: ReferenceMap::new(ResourceKind::Skill),
            queues: ReferenceMap::new(ResourceKind::Queue)
        }
    }
}

/// Identifiers that fell back to a placeholder during enrichment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionGaps {
    pub divisions: usize,
    pub skills: usize,
    pub queues: usize,
    pub users_affected: usize
}

impl ResolutionGaps {
    pub fn total(&self) -> usize {
        self.divisions + self.skills + self.queues
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    fn record(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Division => self.divisions += 1,
            ResourceKind::Skill => self.skills += 1,
            ResourceKind::Queue => self.queues += 1
        }
    }
}

/// Replaces every identifier on `raw_user` with its display name.
///
/// Unresolved identifiers become the kind's placeholder in place, so the
/// skill and queue lists keep their length and order.
pub fn enrich(
    raw_user: &RawUser,
    division_map: &ReferenceMap,
    skill_map: &ReferenceMap,
    queue_map: &ReferenceMap
) -> EnrichedUser {
    let mut gaps = ResolutionGaps::default();
    enrich_tracked(raw_user, division_map, skill_map, queue_map, &mut gaps)
}

/// Enriches every user in order and tallies the placeholders used.
pub fn enrich_all(users: &[RawUser], maps: &ReferenceMaps) -> (Vec<EnrichedUser>, ResolutionGaps) {
    let mut gaps = ResolutionGaps::default();
    let enriched = users
        .iter()
        .map(|user| {
            let before = gaps.total();
            let enriched =
                enrich_tracked(user, &maps.divisions, &maps.skills, &maps.queues, &mut gaps);
            if gaps.total() > before {
                gaps.users_affected += 1;
            }
            enriched
        })
        .collect();
    (enriched, gaps)
}

fn enrich_tracked(
    raw_user: &RawUser,
    division_map: &ReferenceMap,
    skill_map: &ReferenceMap,
    queue_map: &ReferenceMap,
    gaps: &mut ResolutionGaps
) -> EnrichedUser {
    let division = match raw_user.division_id.as_deref() {
        Some(id) => lookup(raw_user, division_map, id, gaps),
        None => {
            warn!(user_id = %raw_user.id, "User has no division");
            gaps.record(ResourceKind::Division);
            NO_DIVISION.to_string()
        }
    };

    let skills = raw_user
        .skill_ids
        .iter()
        .map(|id| lookup(raw_user, skill_map, id, gaps))
        .collect();

    let queues = raw_user
        .queue_ids
        .iter()
        .map(|id| lookup(raw_user, queue_map, id, gaps))
        .collect();

    EnrichedUser {
        id: raw_user.id.clone(),
        name: raw_user.name.clone(),
        email: raw_user.email.clone(),
        division,
        skills,
        queues
    }
}

fn lookup(user: &RawUser, map: &ReferenceMap, id: &str, gaps: &mut ResolutionGaps) -> String {
    match map.get(id) {
        Some(name) => name.to_string(),
        None => {
            warn!(
                user_id = %user.id,
                kind = %map.kind(),
                id = %id,
                "Unresolved reference, using placeholder"
            );
            gaps.record(map.kind());
            map.kind().unresolved_placeholder().to_string()
        }
    }
}
