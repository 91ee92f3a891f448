pub mod aggregator;
pub mod dedup;
pub mod enrich;
pub mod executor;
pub mod fetcher;
pub mod pacing;
pub mod parser;
pub mod report;
pub mod sink;
pub mod sources;
pub mod traits;
pub mod types;
pub mod utils;

pub use types::*;
pub use aggregator::{allocate, AggregationRun, StudentAggregator};
pub use dedup::{Deduplicator, MergeOutcome};
pub use enrich::enrich;
pub use executor::RequestExecutor;
pub use fetcher::{Fetcher, HttpResponse, HttpTransport};
pub use pacing::{Pacer, RecordingPacer, TokioPacer};
pub use parser::ProfileParser;
pub use report::render_usage_report;
pub use sink::JsonFileSink;
pub use sources::{DomainEmailSource, MockSource, ProfileScrapeSource};
pub use traits::{AdapterUsage, SourceAdapter};
