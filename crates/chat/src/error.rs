use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The transport refused or failed an outbound request.
    #[error("{operation} failed: {source}")]
    Outbound {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn outbound(
        operation: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Outbound {
            operation,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
