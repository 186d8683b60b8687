use async_trait::async_trait;
use cfapps_core_types::AppGuid;

use crate::errors::FetchError;
use crate::model::{EventRecord, FeedUpdate, RawEventRecord};
use crate::policy::FeedPolicyView;

/// Remote event API for one application.
#[async_trait]
pub trait EventFetchPort: Send + Sync {
    async fn fetch_events(&self, subject: &AppGuid) -> Result<Vec<RawEventRecord>, FetchError>;
}

/// Human readable description of an attribute change event.
pub trait AttributeSummarizer: Send + Sync {
    fn summarize(&self, record: &EventRecord) -> String;
}

/// Where status and content changes are announced to the presentation layer.
pub trait StatusPort: Send + Sync {
    fn publish(&self, update: FeedUpdate);
}

pub trait PolicyPort: Send + Sync {
    fn view(&self) -> FeedPolicyView;
}
