use banter_domain::ResultStream;

use crate::Error;

/// A text-generation backend. `stream` yields a lazy, finite,
/// non-restartable sequence of text fragments; fragment size and count are
/// not guaranteed.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync {
    async fn stream(&self, prompt: &str) -> ResultStream<String, Error>;
}

pub struct Service;
