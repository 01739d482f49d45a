mod projections;
mod record_source;

pub use record_source::PostgresRecordSource;
