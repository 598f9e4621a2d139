pub mod address;
pub mod config;
pub mod context;
pub mod dedup;
pub mod detail;
pub mod feed;
pub mod gateway;
pub mod metrics;
pub mod search;
pub mod slot;
pub mod testing;

pub use address::BrowseAddress;
pub use config::{
    load_and_validate, load_config, load_config_from_str, validate_config, Config, ConfigError,
    FeedConfig, GatewayConfig, SearchConfig,
};
pub use context::BrowseContext;
pub use dedup::{dedup_by_title, normalize_title};
pub use detail::DetailView;
pub use feed::{CatalogFeedManager, Highlights, ResultsView};
pub use gateway::{
    CatalogError, CatalogGateway, CatalogItem, CatalogPage, JikanClient, PageInfo,
    RelatedEntry, RelationGroup, SearchCriteria,
};
pub use search::{CommitOutcome, SearchOrchestrator, SearchTier, ValidationRejection};
pub use slot::{Completion, SlotPhase, SlotSnapshot, Submission, TaskSlot};
