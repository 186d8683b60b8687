//! Application event feed
//!
//! Wires the event feed core to file based configuration and logging.

pub mod config;
pub mod logging;

pub use cfapps_core_types::{AppGuid, CoreError};
pub use cfapps_event_feed as feed;
pub use cfapps_event_feed::{
    ClassifiedEvent, EventFeed, FeedError, FeedPolicyView, FeedService, FeedSnapshot, FeedUpdate,
    RefreshOutcome, RefreshStatus,
};
pub use config::{load_config, AppConfig, LoadedConfig};
pub use logging::init_logging;
