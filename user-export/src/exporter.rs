//! Run orchestration: authenticate, load references, load users, enrich,
//! write.
//!
//! Stages advance strictly in order. A failure in any stage aborts the run
//! with the error that caused it; nothing is written unless every earlier
//! stage succeeded.

use crate::enrich::{ReferenceMaps, ResolutionGaps, enrich_all};
use crate::error::{ExportError, ExportResult};
use crate::model::{EntityRef, ExportRow, RawUser, UserEntity};
use crate::pagination::PaginatedFetcher;
use crate::reference::{ReferenceResolver, ResourceKind};
use crate::row::build_rows;
use crate::token::TokenProvider;
use crate::writer::{output_path, write_rows};
use chrono::{DateTime, Local, Utc};
use config::{ExportConfig, QueueMembership};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Listing endpoint for users, relative to the API base URL.
pub const USERS_ENDPOINT: &str = "users";

/// Expansion requested with every users page when queues are listed per user.
pub const USER_EXPAND: &str = "skills";

/// Expansion requested when queue memberships are read from the listing.
pub const USER_EXPAND_WITH_QUEUES: &str = "skills,queues";

/// Queue memberships of one user, relative to the API base URL.
pub fn user_queues_endpoint(user_id: &str) -> String {
    format!("{}/{}/queues", USERS_ENDPOINT, urlencoding::encode(user_id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStage {
    Started,
    Authenticated,
    ReferencesLoaded,
    UsersLoaded,
    Enriched,
    Exported
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Started => "started",
            Self::Authenticated => "authenticated",
            Self::ReferencesLoaded => "references_loaded",
            Self::UsersLoaded => "users_loaded",
            Self::Enriched => "enriched",
            Self::Exported => "exported"
        };
        write!(f, "{}", name)
    }
}

/// Sizes of the three reference mappings built for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingSizes {
    pub divisions: usize,
    pub skills: usize,
    pub queues: usize
}

impl From<&ReferenceMaps> for MappingSizes {
    fn from(maps: &ReferenceMaps) -> Self {
        Self {
            divisions: maps.divisions.len(),
            skills: maps.skills.len(),
            queues: maps.queues.len()
        }
    }
}

/// Summary of one export run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub stage: ExportStage,
    pub users: usize,
    pub rows: usize,
    pub mappings: MappingSizes,
    pub gaps: ResolutionGaps,
    pub output_path: Option<PathBuf>
}

impl ExportReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            completed_at: None,
            stage: ExportStage::Started,
            users: 0,
            rows: 0,
            mappings: MappingSizes::default(),
            gaps: ResolutionGaps::default(),
            output_path: None
        }
    }

    fn advance(&mut self, stage: ExportStage) {
        self.stage = stage;
        info!(stage = %stage, "Export stage reached");
    }

    fn fail(&self, e: &ExportError) {
        error!(stage = %self.stage, error = %e, "Export aborted");
    }
}

pub struct Exporter {
    config: ExportConfig,
    tokens: Arc<TokenProvider>,
    fetcher: PaginatedFetcher
}

impl Exporter {
    /// Validates `config` and prepares the HTTP client, token provider and
    /// fetcher. No request is made until a run starts.
    pub fn new(config: ExportConfig) -> ExportResult<Self> {
        config::validate(&config)
            .map_err(|e| ExportError::ConfigError(format!("Invalid configuration: {}", e)))?;

        let http_client = Client::builder()
            .timeout(config.platform.timeout())
            .build()
            .map_err(|e| ExportError::ConfigError(format!("Cannot build HTTP client: {}", e)))?;

        let tokens = Arc::new(TokenProvider::new(http_client.clone(), &config.platform));
        let fetcher = PaginatedFetcher::new(
            http_client,
            config.platform.api_base_url(),
            tokens.clone(),
            config.api.retry.clone()
        );

        Ok(Self {
            config,
            tokens,
            fetcher
        })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Runs every stage up to and including enrichment and returns the rows.
    pub async fn collect_rows(&self) -> ExportResult<(Vec<ExportRow>, ExportReport)> {
        let mut report = ExportReport::new();
        match self.collect_into(&mut report).await {
            Ok(rows) => {
                report.completed_at = Some(Utc::now());
                Ok((rows, report))
            }
            Err(e) => {
                report.fail(&e);
                Err(e)
            }
        }
    }

    /// Collects rows and writes them to a timestamped file under the
    /// configured output directory.
    pub async fn run(&self) -> ExportResult<ExportReport> {
        let (rows, mut report) = self.collect_rows().await?;

        let output = &self.config.output;
        let written = output_path(
            &output.directory,
            &output.filename,
            output.format,
            &output.timestamp_format,
            &Local::now()
        )
        .and_then(|path| write_rows(&rows, output.format, &path).map(|()| path));

        match written {
            Ok(path) => {
                report.output_path = Some(path);
                report.advance(ExportStage::Exported);
                report.completed_at = Some(Utc::now());
                Ok(report)
            }
            Err(e) => {
                report.fail(&e);
                Err(e)
            }
        }
    }

    async fn collect_into(&self, report: &mut ExportReport) -> ExportResult<Vec<ExportRow>> {
        self.tokens.get_token().await?;
        report.advance(ExportStage::Authenticated);

        let maps = self.load_references().await?;
        report.mappings = MappingSizes::from(&maps);
        report.advance(ExportStage::ReferencesLoaded);

        let users = self.load_users().await?;
        report.users = users.len();
        report.advance(ExportStage::UsersLoaded);

        let (enriched, gaps) = enrich_all(&users, &maps);
        if !gaps.is_empty() {
            info!(
                divisions = gaps.divisions,
                skills = gaps.skills,
                queues = gaps.queues,
                users_affected = gaps.users_affected,
                "Some references could not be resolved"
            );
        }
        report.gaps = gaps;

        let rows = build_rows(&enriched);
        report.rows = rows.len();
        report.advance(ExportStage::Enriched);

        Ok(rows)
    }

    async fn load_references(&self) -> ExportResult<ReferenceMaps> {
        let page_size = self.config.api.page_size;
        let mut maps = ReferenceMaps::empty();
        for kind in ResourceKind::ALL {
            let map = ReferenceResolver::new(kind, &self.fetcher, page_size)
                .resolve_all()
                .await?;
            match kind {
                ResourceKind::Division => maps.divisions = map,
                ResourceKind::Skill => maps.skills = map,
                ResourceKind::Queue => maps.queues = map
            }
        }
        Ok(maps)
    }

    async fn load_users(&self) -> ExportResult<Vec<RawUser>> {
        let membership = self.config.api.queue_membership;
        let expand = match membership {
            QueueMembership::PerUser => USER_EXPAND,
            QueueMembership::Expand => USER_EXPAND_WITH_QUEUES
        };
        let entities: Vec<UserEntity> = self
            .fetcher
            .fetch_all_with(USERS_ENDPOINT, self.config.api.page_size, &[("expand", expand)])
            .await?;
        let mut users: Vec<RawUser> = entities.into_iter().map(RawUser::from).collect();

        if membership == QueueMembership::PerUser {
            for user in &mut users {
                user.queue_ids = self.load_queue_ids(&user.id).await?;
            }
            info!(users = users.len(), "Loaded queue memberships per user");
        }
        Ok(users)
    }

    async fn load_queue_ids(&self, user_id: &str) -> ExportResult<Vec<String>> {
        let queues: Vec<EntityRef> = self
            .fetcher
            .fetch_all(&user_queues_endpoint(user_id), self.config.api.page_size)
            .await?;
        Ok(queues.into_iter().map(|queue| queue.id).collect())
    }
}
