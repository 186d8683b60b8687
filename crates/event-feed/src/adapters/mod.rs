mod callback;
mod status;

pub use callback::{CallbackFetchAdapter, FetchCallback};
pub use status::{to_mpsc, to_mpsc_on, BroadcastStatusPort, NoopStatusPort};
