use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::resumes::extract::FileKind;

/// `resumes/{job_id}/{YYYYmmdd_HHMMSS}_{8 hex}.{ext}`
pub fn object_key(job_id: i64, kind: FileKind, now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "resumes/{job_id}/{}_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        &suffix[..8],
        kind.extension()
    )
}

pub async fn put_resume(
    s3: &S3Client,
    bucket: &str,
    key: &str,
    kind: FileKind,
    bytes: Vec<u8>,
) -> Result<(), AppError> {
    let size = bytes.len();
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(bytes))
        .content_type(kind.content_type())
        .send()
        .await
        .map_err(|e| AppError::S3(format!("upload of {key} failed: {e}")))?;

    info!("Uploaded resume to s3://{bucket}/{key} ({size} bytes)");
    Ok(())
}

pub async fn delete_resume(s3: &S3Client, bucket: &str, key: &str) -> Result<(), AppError> {
    s3.delete_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("delete of {key} failed: {e}")))?;

    info!("Deleted s3://{bucket}/{key}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_object_key_layout() {
        let now = Utc.with_ymd_and_hms(2025, 5, 4, 3, 57, 9).unwrap();
        let key = object_key(42, FileKind::Pdf, now);
        assert!(key.starts_with("resumes/42/20250504_035709_"), "{key}");
        assert!(key.ends_with(".pdf"));
        let stem = key.trim_start_matches("resumes/42/20250504_035709_").trim_end_matches(".pdf");
        assert_eq!(stem.len(), 8);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_object_keys_are_unique() {
        let now = Utc::now();
        assert_ne!(object_key(1, FileKind::Txt, now), object_key(1, FileKind::Txt, now));
    }
}
