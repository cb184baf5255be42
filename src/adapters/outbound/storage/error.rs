use crate::ports::storage::BackendError;

/// Convert object_store errors to backend errors
impl From<object_store::Error> for BackendError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { .. } => BackendError::NoSuchKey,
            object_store::Error::AlreadyExists { path, .. } => BackendError::Service {
                message: format!("Object already exists: {}", path),
            },
            other => BackendError::Service {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_no_such_key() {
        let err = object_store::Error::NotFound {
            path: "a.txt".to_string(),
            source: "missing".into(),
        };
        assert_eq!(BackendError::from(err), BackendError::NoSuchKey);
    }

    #[test]
    fn test_generic_maps_to_service() {
        let err = object_store::Error::Generic {
            store: "InMemory",
            source: "boom".into(),
        };
        assert!(matches!(
            BackendError::from(err),
            BackendError::Service { .. }
        ));
    }
}
