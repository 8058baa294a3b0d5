pub mod enrich;
pub mod error;
pub mod exporter;
pub mod model;
pub mod pagination;
pub mod reference;
pub mod row;
pub mod token;
pub mod writer;

pub use enrich::{ReferenceMaps, ResolutionGaps, enrich, enrich_all};
pub use error::{ExportError, ExportResult};
pub use exporter::{ExportReport, ExportStage, Exporter, MappingSizes};
pub use model::{EXPORT_HEADERS, EnrichedUser, ExportRow, RawUser};
pub use pagination::PaginatedFetcher;
pub use reference::{ReferenceMap, ReferenceResolver, ResourceKind};
pub use row::build_row;
pub use token::{Credential, TokenProvider};
pub use writer::{output_path, write_rows};
