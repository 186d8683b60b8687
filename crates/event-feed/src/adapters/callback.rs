use async_trait::async_trait;
use cfapps_core_types::AppGuid;
use tokio::sync::oneshot;
use tracing::warn;

use crate::errors::FetchError;
use crate::model::RawEventRecord;
use crate::ports::EventFetchPort;

/// Completion handler in the `(events?, error?)` style of callback clients.
pub type FetchCallback = Box<dyn FnOnce(Option<Vec<RawEventRecord>>, Option<FetchError>) + Send>;

/// Bridges a callback-based API client onto [`EventFetchPort`].
///
/// Events win over an error delivered alongside them; the error is logged.
/// A callback invoked with neither is an [`FetchError::EmptyResponse`], one
/// dropped without being invoked is [`FetchError::Abandoned`].
pub struct CallbackFetchAdapter<F> {
    fetch: F,
}

impl<F> CallbackFetchAdapter<F>
where
    F: Fn(AppGuid, FetchCallback) + Send + Sync,
{
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

#[async_trait]
impl<F> EventFetchPort for CallbackFetchAdapter<F>
where
    F: Fn(AppGuid, FetchCallback) + Send + Sync,
{
    async fn fetch_events(&self, subject: &AppGuid) -> Result<Vec<RawEventRecord>, FetchError> {
        let (tx, rx) = oneshot::channel();
        let callback: FetchCallback = Box::new(move |events, error| {
            let _ = tx.send((events, error));
        });
        (self.fetch)(subject.clone(), callback);

        match rx.await {
            Ok((Some(events), error)) => {
                if let Some(err) = error {
                    warn!(%subject, %err, "fetch returned events together with an error");
                }
                Ok(events)
            }
            Ok((None, Some(err))) => Err(err),
            Ok((None, None)) => Err(FetchError::EmptyResponse),
            Err(_) => Err(FetchError::Abandoned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> RawEventRecord {
        json!({"timestamp": "2020-01-02T03:04:05Z"})
            .as_object()
            .cloned()
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn events_are_delivered() {
        let adapter = CallbackFetchAdapter::new(|subject: AppGuid, done: FetchCallback| {
            assert_eq!(subject.as_str(), "A1");
            done(Some(vec![record()]), None);
        });
        let events = adapter.fetch_events(&AppGuid::from("A1")).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn events_win_over_error() {
        let adapter = CallbackFetchAdapter::new(|_: AppGuid, done: FetchCallback| {
            done(Some(vec![]), Some(FetchError::Transport("partial".into())));
        });
        assert_eq!(adapter.fetch_events(&AppGuid::from("A1")).await, Ok(vec![]));
    }

    #[tokio::test]
    async fn error_only_is_failure() {
        let adapter = CallbackFetchAdapter::new(|_: AppGuid, done: FetchCallback| {
            done(None, Some(FetchError::Unauthorized));
        });
        assert_eq!(
            adapter.fetch_events(&AppGuid::from("A1")).await,
            Err(FetchError::Unauthorized)
        );
    }

    #[tokio::test]
    async fn neither_events_nor_error_is_empty_response() {
        let adapter = CallbackFetchAdapter::new(|_: AppGuid, done: FetchCallback| done(None, None));
        assert_eq!(
            adapter.fetch_events(&AppGuid::from("A1")).await,
            Err(FetchError::EmptyResponse)
        );
    }

    #[tokio::test]
    async fn dropped_callback_is_abandoned() {
        let adapter = CallbackFetchAdapter::new(|_: AppGuid, done: FetchCallback| drop(done));
        assert_eq!(
            adapter.fetch_events(&AppGuid::from("A1")).await,
            Err(FetchError::Abandoned)
        );
    }

    #[tokio::test]
    async fn callback_may_complete_from_another_task() {
        let adapter = CallbackFetchAdapter::new(|_: AppGuid, done: FetchCallback| {
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                done(Some(vec![record(), record()]), None);
            });
        });
        let events = adapter.fetch_events(&AppGuid::from("A1")).await.unwrap();
        assert_eq!(events.len(), 2);
    }
}
