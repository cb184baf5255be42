use crate::domain::errors::ValidationError;

/// An object key inside a bucket
///
/// Keys are opaque to the service: separators, empty segments and
/// reserved characters are passed to the backend unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub const MAX_LEN: usize = 1024;

    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        if value.is_empty() {
            return Err(ValidationError::EmptyObjectKey);
        }

        if value.len() > Self::MAX_LEN {
            return Err(ValidationError::ObjectKeyTooLong {
                actual: value.len(),
                max: Self::MAX_LEN,
            });
        }

        if value.contains('\0') {
            return Err(ValidationError::InvalidObjectKeyCharacter('\0'));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ObjectKey {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ObjectKey {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_object_key() {
        assert!(ObjectKey::new("a.txt").is_ok());
        assert!(ObjectKey::new("folder/file.txt").is_ok());
        assert!(ObjectKey::new("reports/2024/q1 summary.pdf").is_ok());
        assert!(ObjectKey::new("dir/").is_ok());
        assert!(ObjectKey::new("/leading-slash").is_ok());
        assert!(ObjectKey::new("double//slash").is_ok());
        assert!(ObjectKey::new("report[1].txt").is_ok());
    }

    #[test]
    fn test_invalid_object_key() {
        assert_eq!(ObjectKey::new(""), Err(ValidationError::EmptyObjectKey));
        assert!(ObjectKey::new("null\0byte").is_err());
        assert!(ObjectKey::new("x".repeat(1025)).is_err());
    }
}
