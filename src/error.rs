use thiserror::Error;

use crate::parse::ParseError;
use crate::CatalogError;

/// Unified error type for loading declarations.
///
/// Returned by convenience methods like [`Catalog::from_manifest()`](crate::Catalog::from_manifest)
/// and [`Catalog::from_file()`](crate::Catalog::from_file). Verification itself
/// reports [`VerifyError`](crate::VerifyError).
#[derive(Debug, Error)]
pub enum GatehouseError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
