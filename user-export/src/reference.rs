use crate::enrich::{NO_DIVISION, UNKNOWN_QUEUE, UNKNOWN_SKILL};
use crate::error::ExportResult;
use crate::pagination::PaginatedFetcher;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{info, warn};

/// Name recorded for a reference element that arrives without one.
pub const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Division,
    Skill,
    Queue
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [Self::Division, Self::Skill, Self::Queue];

    /// Listing endpoint, relative to the API base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Division => "authorization/divisions",
            Self::Skill => "routing/skills",
            Self::Queue => "routing/queues"
        }
    }

    /// Display value substituted for an identifier missing from the mapping.
    pub fn unresolved_placeholder(self) -> &'static str {
        match self {
            Self::Division => NO_DIVISION,
            Self::Skill => UNKNOWN_SKILL,
            Self::Queue => UNKNOWN_QUEUE
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Division => write!(f, "division"),
            Self::Skill => write!(f, "skill"),
            Self::Queue => write!(f, "queue")
        }
    }
}

/// Element of a division, skill or queue listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceEntity {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>
}

/// Identifier to display-name mapping for one resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceMap {
    kind: ResourceKind,
    names: HashMap<String, String>
}

impl ReferenceMap {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            names: HashMap::new()
        }
    }

    /// Builds a mapping in fetch order; a repeated identifier keeps the name
    /// seen last.
    pub fn from_entities(
        kind: ResourceKind,
        entities: impl IntoIterator<Item = ReferenceEntity>
    ) -> Self {
        let mut map = Self::new(kind);
        for entity in entities {
            let name = match entity.name {
                Some(name) => name,
                None => {
                    warn!(kind = %kind, id = %entity.id, "Reference element has no name");
                    UNKNOWN_NAME.to_string()
                }
            };
            map.insert(entity.id, name);
        }
        map
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(id.into(), name.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Display name for `id`, or this kind's placeholder when it is unknown.
    pub fn resolve(&self, id: &str) -> &str {
        self.get(id)
            .unwrap_or_else(|| self.kind.unresolved_placeholder())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Loads the complete mapping for one resource kind.
pub struct ReferenceResolver<'a> {
    kind: ResourceKind,
    fetcher: &'a PaginatedFetcher,
    page_size: u32
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(kind: ResourceKind, fetcher: &'a PaginatedFetcher, page_size: u32) -> Self {
        Self {
            kind,
            fetcher,
            page_size
        }
    }

    pub async fn resolve_all(&self) -> ExportResult<ReferenceMap> {
        let entities: Vec<ReferenceEntity> = self
            .fetcher
            .fetch_all(self.kind.endpoint(), self.page_size)
            .await?;
        let fetched = entities.len();

        let map = ReferenceMap::from_entities(self.kind, entities);
        info!(
            kind = %self.kind,
            fetched,
            distinct = map.len(),
            "Built reference mapping"
        );
        Ok(map)
    }
}
