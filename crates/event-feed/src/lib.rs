pub mod adapters;
pub mod api;
pub mod classify;
pub mod decode;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod policy;
pub mod ports;
pub mod present;
pub mod store;
pub mod summary;
pub mod timestamp;

pub use api::{EventFeed, FeedService};
pub use errors::{DecodeError, ErrorKind, FeedError, FeedResult, FetchError, FormatError};
pub use model::{
    ClassifiedEvent, EventRecord, FeedSnapshot, FeedUpdate, RawEventRecord, RefreshOutcome,
    RefreshStatus,
};
pub use policy::{FeedPolicyHandle, FeedPolicyView, RefreshMode};
pub use store::FeedStore;
pub use timestamp::TimestampFormatter;
