//! Load failures surfaced by the mesh loaders

use thiserror::Error;

use crate::stl::StlError;

/// Why a single part failed to load
#[derive(Error, Debug)]
pub enum LoadCause {
    #[error("fetch failed: {0}")]
    Fetch(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("decode failed: {0}")]
    Decode(#[from] StlError),
    #[error("SHA mismatch: expected {expected}, got {actual}")]
    ShaMismatch { expected: String, actual: String },
}

/// A part that could not be loaded. Terminal for that part and for its batch.
///
/// The message already spells out `cause`, so it is not reported again as the
/// error source.
#[derive(Error, Debug)]
#[error("Failed to load part '{part}': {cause}")]
pub struct LoadError {
    pub part: String,
    pub cause: LoadCause,
}

impl LoadError {
    pub fn new(part: impl Into<String>, cause: LoadCause) -> Self {
        Self {
            part: part.into(),
            cause,
        }
    }

    pub fn fetch(
        part: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::new(part, LoadCause::Fetch(Box::new(error)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_names_part() {
        let err = LoadError::new("Aortic arch", LoadCause::Decode(StlError::Empty));
        assert_eq!(
            err.to_string(),
            "Failed to load part 'Aortic arch': decode failed: STL contains no triangles"
        );

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = LoadError::fetch("Celiac trunk", io);
        assert!(err.to_string().contains("fetch failed: missing"));
    }

    #[test]
    fn test_cause_reported_once() {
        use std::error::Error as _;

        let err = LoadError::new("Aortic arch", LoadCause::Decode(StlError::Empty));
        assert!(err.source().is_none());

        let chain = std::iter::successors(Some(&err as &dyn std::error::Error), |e: &&dyn std::error::Error| (*e).source())
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(chain.matches("STL contains no triangles").count(), 1);
    }
}
