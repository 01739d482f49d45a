//! Data types shared by the clinic search layers: index names, document
//! projections, search requests/results and sync value objects.

pub mod documents;
pub mod index_name;
pub mod search_query;
pub mod search_result;
pub mod sync;

pub use documents::{
    Address, AppointmentDocument, ClinicDocument, FaqDocument, GeoPoint, HealthRecordDocument,
    IndexableDocument, PetDocument, UserDocument,
};
pub use index_name::{IndexName, UnknownIndexName};
pub use search_query::{
    DateRange, FilterKind, GlobalSearchRequest, SearchFilters, SearchOptions, SortField,
    SortOrder, MAX_RESULT_WINDOW, MAX_SEARCH_SIZE,
};
pub use search_result::{GlobalSearchResult, SearchHit, SearchResult, Suggestion};
pub use sync::{IndexSyncStatus, SyncOptions, SyncResult, SyncState, DEFAULT_BATCH_SIZE};
