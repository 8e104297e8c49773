#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[cfg(feature = "prometheus")]
    #[error(transparent)]
    Prometheus(#[from] metrics_exporter_prometheus::BuildError),

    #[error("invalid metrics listen address `{address}`: {source}")]
    InvalidListen {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
