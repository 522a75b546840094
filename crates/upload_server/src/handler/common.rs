pub mod response;
pub mod upload_error;

use upload_error::UploadError;

/// Rejects a missing or blank filename; the object key is derived from it.
pub fn require_filename(filename: &str) -> Result<&str, UploadError> {
    if filename.trim().is_empty() {
        tracing::warn!("request rejected: empty filename");
        return Err(UploadError::BadRequest);
    }
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_filename() {
        assert_eq!(require_filename("a.mp4").unwrap(), "a.mp4");
        assert!(matches!(require_filename(""), Err(UploadError::BadRequest)));
        assert!(matches!(require_filename("   "), Err(UploadError::BadRequest)));
    }
}
