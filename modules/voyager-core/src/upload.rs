use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use dropbox_client::{DropboxError, UploadArg};
use voyager_common::{UploadRecord, VoyagerError, JPEG_DATA_URL_PREFIX};

use crate::traits::FolderStore;

pub const FILE_EXTENSION: &str = "jpg";

/// Drop a leading `data:image/jpeg;base64,` if present.
pub fn strip_data_url(payload: &str) -> &str {
    payload
        .strip_prefix(JPEG_DATA_URL_PREFIX)
        .unwrap_or(payload)
}

/// `<millis>.jpg`, or `<millis>-<n>.jpg` when several uploads share a millisecond.
pub fn file_name(at: DateTime<Utc>, discriminator: Option<usize>) -> String {
    let millis = at.timestamp_millis();
    match discriminator {
        Some(n) => format!("{millis}-{n}.{FILE_EXTENSION}"),
        None => format!("{millis}.{FILE_EXTENSION}"),
    }
}

/// Upload one captcha payload (base64, optionally as a data URL) into `folder`.
///
/// Write mode is `add` with autorename off. No retry.
pub async fn upload_captcha(
    store: &dyn FolderStore,
    folder: &str,
    payload: &str,
    discriminator: Option<usize>,
) -> UploadRecord {
    let destination = format!("{folder}/{}", file_name(Utc::now(), discriminator));

    let bytes = match STANDARD.decode(strip_data_url(payload).trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            return UploadRecord::failed(destination, format!("Captcha payload is not valid base64: {e}"))
        }
    };

    match store.upload(&UploadArg::add(&destination), bytes).await {
        Ok(meta) => {
            let stored = meta.path_display.unwrap_or_else(|| destination.clone());
            info!(path = %stored, "Captcha stored");
            UploadRecord::stored(stored)
        }
        Err(e) => {
            warn!(path = %destination, error = %e, "Captcha upload failed");
            UploadRecord::failed(destination, describe_upload_error(&e).to_string())
        }
    }
}

fn describe_upload_error(e: &DropboxError) -> VoyagerError {
    let detail = match e {
        DropboxError::Api {
            status,
            reason,
            message,
        } => format!("{status} {reason}. Response: {message}"),
        other => other.to_string(),
    };
    VoyagerError::Storage(format!("Failed to upload to Dropbox: {detail}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn strips_only_jpeg_data_url_prefix() {
        assert_eq!(strip_data_url("data:image/jpeg;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_url("QUJD"), "QUJD");
        assert_eq!(
            strip_data_url("data:image/png;base64,QUJD"),
            "data:image/png;base64,QUJD"
        );
    }

    #[test]
    fn file_names_use_epoch_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(file_name(at, None), "1700000000123.jpg");
        assert_eq!(file_name(at, Some(4)), "1700000000123-4.jpg");
    }

    #[test]
    fn api_errors_read_like_dropbox_failures() {
        let err = DropboxError::Api {
            status: 400,
            reason: "Bad Request".into(),
            message: "bad arg".into(),
        };
        let described = describe_upload_error(&err);
        assert!(matches!(described, VoyagerError::Storage(_)));
        assert_eq!(
            described.to_string(),
            "Failed to upload to Dropbox: 400 Bad Request. Response: bad arg"
        );
    }

    #[test]
    fn transport_errors_are_storage_failures_too() {
        let described = describe_upload_error(&DropboxError::Network("connection reset".into()));
        assert_eq!(
            described.to_string(),
            "Failed to upload to Dropbox: Network error: connection reset"
        );
    }
}
