use thiserror::Error;

/// Errors surfaced by the catalog, the publisher and the query functions.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to load catalog from {source_name}: {message}")]
    CatalogLoad { source_name: String, message: String },

    #[error("failed to publish page for letter {letter}: {message}")]
    Publish { letter: String, message: String },

    #[error("failed to open page service session: {message}")]
    SessionInit { message: String },

    #[error("catalog is empty")]
    EmptyCatalog,

    #[error("catalog index is not ready yet")]
    IndexNotReady,

    #[error("search keyword is empty")]
    EmptyKeyword,

    #[error("chat transport error: {message}")]
    Transport { message: String },
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
