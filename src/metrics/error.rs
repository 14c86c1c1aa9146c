#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported metric encoding `{type_url}`")]
    UnsupportedMetricEncoding { type_url: String },
    #[error("failed to decode metrics of type `{type_url}`: {source}")]
    Decode {
        type_url: String,
        #[source]
        source: prost::DecodeError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
