//! Conversion of resolved settings into backend requests.
//!
//! Everything here is pure: the queue supplies the clock and the ambient
//! key bundle, so the same inputs always produce the same request.

use mediastash_protocol::{
    BackendCompression, BackendEncryption, BackendSettings, KeyBundle, SourceLocator,
    TransferRequest,
};
use mediastash_settings::ProcessingSettings;

use crate::error::UploadError;

/// What the worker knows about the item it is about to send.
#[derive(Debug, Clone)]
pub struct TransferJob {
    pub item_id: String,
    pub source: SourceLocator,
    pub name: String,
    pub settings: ProcessingSettings,
    pub secret: Option<String>,
}

/// Maps settings onto the backend's field layout.
///
/// The encryption flags are only set while encryption is enabled, so a
/// disabled config never asks the backend for a password or key.
pub fn to_backend_settings(settings: &ProcessingSettings) -> BackendSettings {
    let c = &settings.compression;
    let e = &settings.encryption;
    BackendSettings {
        compression: BackendCompression {
            enabled: c.enabled,
            algorithm: c.algorithm.as_str().to_string(),
            level: c.level,
            prefer_speed: c.prefer_speed,
            min_size_threshold: c.min_size_threshold,
            skip_already_compressed: c.skip_already_compressed,
        },
        encryption: BackendEncryption {
            enabled: e.enabled,
            use_password: e.enabled && e.use_password,
            use_keypair: e.enabled && e.use_keypair,
        },
    }
}

/// Makes a name safe to use as a remote path segment.
pub fn sanitize_filename(name: &str) -> String {
    name.replace("..", "").replace(['/', '\\'], "_")
}

/// Remote name for an upload: `<unix millis>_<sanitized name>`.
pub fn generated_name(display_name: &str, now_millis: i64) -> String {
    format!("{now_millis}_{}", sanitize_filename(display_name))
}

/// Fails fast when the settings ask for encryption the caller cannot do.
pub fn check_preconditions(
    settings: &BackendSettings,
    key_bundle: Option<&KeyBundle>,
    secret: Option<&str>,
) -> Result<(), UploadError> {
    let enc = &settings.encryption;
    if enc.use_keypair && key_bundle.is_none_or(KeyBundle::is_empty) {
        return Err(UploadError::MissingKeyBundle);
    }
    if enc.use_password && secret.is_none_or(str::is_empty) {
        return Err(UploadError::MissingSecret);
    }
    Ok(())
}

/// Builds the `transfer_item` request for a job.
///
/// A recipient bundle on the item's own settings wins over the ambient
/// bundle. The bundle and secret are attached only when the matching
/// encryption mode is in use.
pub fn build_request(
    job: &TransferJob,
    destination: &str,
    ambient_key_bundle: Option<&KeyBundle>,
    now_millis: i64,
) -> Result<TransferRequest, UploadError> {
    let settings = to_backend_settings(&job.settings);
    let key_bundle = job
        .settings
        .encryption
        .recipient_key_bundle
        .as_ref()
        .or(ambient_key_bundle);
    let secret = job.secret.as_deref();

    check_preconditions(&settings, key_bundle, secret)?;

    Ok(TransferRequest {
        source: job.source.clone(),
        destination: destination.to_string(),
        generated_name: generated_name(&job.name, now_millis),
        item_id: job.item_id.clone(),
        key_bundle: key_bundle
            .filter(|_| settings.encryption.use_keypair)
            .cloned(),
        secret: secret
            .filter(|_| settings.encryption.use_password)
            .map(str::to_string),
        settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediastash_compression::Algorithm;
    use mediastash_settings::{CompressionConfig, EncryptionConfig};

    fn job(encryption: EncryptionConfig, secret: Option<&str>) -> TransferJob {
        TransferJob {
            item_id: "item-1".into(),
            source: SourceLocator::path("/photos/beach.jpg"),
            name: "beach.jpg".into(),
            settings: ProcessingSettings {
                compression: CompressionConfig {
                    algorithm: Algorithm::Brotli,
                    level: 9,
                    prefer_speed: true,
                    ..CompressionConfig::default()
                },
                encryption,
            },
            secret: secret.map(str::to_string),
        }
    }

    #[test]
    fn translation_uses_backend_field_names() {
        let s = to_backend_settings(&job(EncryptionConfig::keypair(), None).settings);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["compression"]["algorithm"], "brotli");
        assert_eq!(json["compression"]["level"], 9);
        assert_eq!(json["compression"]["prefer_speed"], true);
        assert_eq!(json["compression"]["min_size_threshold"], 1024);
        assert_eq!(json["encryption"]["use_keypair"], true);
        assert_eq!(json["encryption"]["use_password"], false);
    }

    #[test]
    fn disabled_encryption_clears_flags() {
        let enc = EncryptionConfig {
            enabled: false,
            use_password: true,
            use_keypair: true,
            recipient_key_bundle: None,
        };
        let s = to_backend_settings(&job(enc, None).settings);
        assert!(!s.encryption.use_password);
        assert!(!s.encryption.use_keypair);
    }

    #[test]
    fn sanitize() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "__etc_passwd");
        assert_eq!(sanitize_filename("a\\b/c.txt"), "a_b_c.txt");
        assert_eq!(sanitize_filename("plain.png"), "plain.png");
        assert_eq!(generated_name("x/y.png", 1700000000123), "1700000000123_x_y.png");
    }

    #[test]
    fn keypair_requires_bundle() {
        let j = job(EncryptionConfig::keypair(), None);
        assert!(matches!(
            build_request(&j, "me/repo", None, 1),
            Err(UploadError::MissingKeyBundle)
        ));
        let empty = KeyBundle::new(Vec::new());
        assert!(matches!(
            build_request(&j, "me/repo", Some(&empty), 1),
            Err(UploadError::MissingKeyBundle)
        ));

        let bundle = KeyBundle::new(vec![1, 2, 3]);
        let req = build_request(&j, "me/repo", Some(&bundle), 1).unwrap();
        assert_eq!(req.key_bundle, Some(bundle));
        assert!(req.secret.is_none());
    }

    #[test]
    fn item_bundle_wins_over_ambient() {
        let own = KeyBundle::new(vec![9]);
        let enc = EncryptionConfig {
            recipient_key_bundle: Some(own.clone()),
            ..EncryptionConfig::keypair()
        };
        let ambient = KeyBundle::new(vec![1]);
        let req = build_request(&job(enc, None), "me/repo", Some(&ambient), 1).unwrap();
        assert_eq!(req.key_bundle, Some(own));
    }

    #[test]
    fn password_requires_secret() {
        let j = job(EncryptionConfig::password(), Some(""));
        assert!(matches!(
            build_request(&j, "me/repo", None, 1),
            Err(UploadError::MissingSecret)
        ));

        let j = job(EncryptionConfig::password(), Some("hunter2"));
        let req = build_request(&j, "me/repo", None, 42).unwrap();
        assert_eq!(req.secret.as_deref(), Some("hunter2"));
        assert!(req.key_bundle.is_none());
        assert_eq!(req.generated_name, "42_beach.jpg");
        assert_eq!(req.item_id, "item-1");
        assert_eq!(req.destination, "me/repo");
    }

    #[test]
    fn unencrypted_request_carries_no_credentials() {
        let bundle = KeyBundle::new(vec![1]);
        let j = job(EncryptionConfig::default(), Some("unused"));
        let req = build_request(&j, "me/repo", Some(&bundle), 1).unwrap();
        assert!(req.key_bundle.is_none());
        assert!(req.secret.is_none());
    }
}
