//! End-to-end retrieval scenarios against a mock catalog.
//!
//! Each test stands up a full mock of the three catalog surfaces the
//! engine touches (token exchange, image listing, download handle plus
//! the pre-signed transfer URL) and drives a [`Session`] through a
//! complete resolve-and-fetch cycle, asserting on what lands on disk.

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use imgvault_engine::{
    Architecture, CatalogConfig, Checksum, DiscoveryConfig, EngineConfig, EngineError,
    OutcomeStatus, RetrievalRequest, Session,
};

const PAYLOAD: &[u8] = b"imgvault e2e payload: not a real installer image\n";

fn payload_checksum() -> Checksum {
    let digest: [u8; 32] = Sha256::digest(PAYLOAD).into();
    Checksum::from_digest(&digest)
}

fn session_for(server: &MockServer) -> Session {
    let mut catalog =
        CatalogConfig::with_endpoints(server.uri(), format!("{}/token", server.uri()));
    catalog.backoff_base = Duration::from_millis(1);

    let engine = EngineConfig {
        discovery: DiscoveryConfig {
            baseline: vec![(9, vec![0])],
            major_lookahead: 1,
            minor_lookahead: 1,
        },
        search_order: vec![Architecture::X86_64],
    };

    Session::new("offline-token", catalog, engine).unwrap()
}

/// Mounts the surfaces every scenario needs: token exchange and a 404
/// fallback so unprobed releases read as absent.
async fn mount_base(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "bearer-abc",
            "expires_in": 900
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(250)
        .mount(server)
        .await;
}

/// Mounts the download handle for `checksum` redirecting to a transfer
/// URL that serves `body`.
async fn mount_download(server: &MockServer, checksum: &Checksum, filename: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/images/{}/download", checksum.as_str())))
        .respond_with(
            ResponseTemplate::new(307).set_body_json(serde_json::json!({
                "body": {
                    "href": format!("{}/content/{filename}", server.uri()),
                    "filename": filename,
                }
            })),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/content/{filename}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_hash_target_downloads_and_verifies() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    let sum = payload_checksum();
    mount_download(&server, &sum, "boot.iso", PAYLOAD).await;

    let dir = TempDir::new().unwrap();
    let session = session_for(&server);
    let outcome = session
        .resolve_and_fetch(RetrievalRequest::for_hash(sum, dir.path()))
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Downloaded);
    assert_eq!(outcome.filename, "boot.iso");
    assert_eq!(outcome.bytes_written, Some(PAYLOAD.len() as u64));
    assert_eq!(std::fs::read(dir.path().join("boot.iso")).unwrap(), PAYLOAD);
}

#[tokio::test]
async fn test_rerun_skips_existing_verified_file() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    let sum = payload_checksum();

    // The transfer URL may be hit once only; the second run must be
    // satisfied from disk.
    Mock::given(method("GET"))
        .and(path(format!("/images/{}/download", sum.as_str())))
        .respond_with(
            ResponseTemplate::new(307).set_body_json(serde_json::json!({
                "body": {
                    "href": format!("{}/content/boot.iso", server.uri()),
                    "filename": "boot.iso",
                }
            })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/content/boot.iso"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PAYLOAD.to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let session = session_for(&server);

    let first = session
        .resolve_and_fetch(RetrievalRequest::for_hash(sum.clone(), dir.path()))
        .await
        .unwrap();
    assert_eq!(first.status, OutcomeStatus::Downloaded);

    let second = session
        .resolve_and_fetch(RetrievalRequest::for_hash(sum, dir.path()))
        .await
        .unwrap();
    assert_eq!(second.status, OutcomeStatus::Skipped);
    assert_eq!(second.bytes_written, None);
    assert_eq!(std::fs::read(dir.path().join("boot.iso")).unwrap(), PAYLOAD);
}

#[tokio::test]
async fn test_corrupted_file_is_replaced() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    let sum = payload_checksum();
    mount_download(&server, &sum, "boot.iso", PAYLOAD).await;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("boot.iso"), b"truncated garbage").unwrap();

    let session = session_for(&server);
    let outcome = session
        .resolve_and_fetch(RetrievalRequest {
            overwrite: true,
            ..RetrievalRequest::for_hash(sum, dir.path())
        })
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Verified);
    assert_eq!(std::fs::read(dir.path().join("boot.iso")).unwrap(), PAYLOAD);

    // Nothing half-finished left next to the image.
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|n| n.to_string_lossy().ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty(), "stray temp files: {leftovers:?}");
}

#[tokio::test]
async fn test_unforced_replacement_reports_downloaded() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    let sum = payload_checksum();
    mount_download(&server, &sum, "boot.iso", PAYLOAD).await;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("boot.iso"), b"truncated garbage").unwrap();

    // Without `overwrite` the mismatched file is still healed, but the
    // outcome reads as a plain download rather than a forced re-verify.
    let session = session_for(&server);
    let outcome = session
        .resolve_and_fetch(RetrievalRequest::for_hash(sum, dir.path()))
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Downloaded);
    assert_eq!(std::fs::read(dir.path().join("boot.iso")).unwrap(), PAYLOAD);
}

#[tokio::test]
async fn test_mismatched_payload_leaves_no_files() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    let sum = payload_checksum();
    mount_download(&server, &sum, "boot.iso", b"tampered bytes").await;

    let dir = TempDir::new().unwrap();
    let session = session_for(&server);
    let err = session
        .resolve_and_fetch(RetrievalRequest::for_hash(sum.clone(), dir.path()))
        .await
        .unwrap_err();

    match err {
        EngineError::ChecksumMismatch { expected, .. } => assert_eq!(expected, sum),
        other => panic!("expected ChecksumMismatch, got {other:?}"),
    }

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert!(entries.is_empty(), "unexpected files: {entries:?}");
}

#[tokio::test]
async fn test_name_target_resolves_then_fetches() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    let sum = payload_checksum();

    Mock::given(method("GET"))
        .and(path("/images/rhel/9.0/x86_64"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "body": [{
                "imageName": "RHEL 9.0 Boot ISO",
                "filename": "rhel-9.0-x86_64-boot.iso",
                "arch": "x86_64",
                "checksum": sum.as_str(),
                "datePublished": "2025-01-01T00:00:00Z",
            }]
        })))
        .mount(&server)
        .await;
    mount_download(&server, &sum, "rhel-9.0-x86_64-boot.iso", PAYLOAD).await;

    let dir = TempDir::new().unwrap();
    let session = session_for(&server);
    let outcome = session
        .resolve_and_fetch(RetrievalRequest::for_name(
            "rhel-9.0-x86_64-boot.iso",
            dir.path(),
        ))
        .await
        .unwrap();

    assert_eq!(outcome.status, OutcomeStatus::Downloaded);
    assert_eq!(outcome.filename, "rhel-9.0-x86_64-boot.iso");
    assert_eq!(
        std::fs::read(dir.path().join("rhel-9.0-x86_64-boot.iso")).unwrap(),
        PAYLOAD
    );
}

#[tokio::test]
async fn test_unknown_name_reports_not_found() {
    let server = MockServer::start().await;
    mount_base(&server).await;

    let dir = TempDir::new().unwrap();
    let session = session_for(&server);
    let err = session
        .resolve_and_fetch(RetrievalRequest::for_name("demo.iso", dir.path()))
        .await
        .unwrap_err();

    match err {
        EngineError::NotFound { filename } => assert_eq!(filename, "demo.iso"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_deadline_cancels_stalled_transfer() {
    let server = MockServer::start().await;
    mount_base(&server).await;
    let sum = payload_checksum();

    Mock::given(method("GET"))
        .and(path(format!("/images/{}/download", sum.as_str())))
        .respond_with(
            ResponseTemplate::new(307).set_body_json(serde_json::json!({
                "body": {
                    "href": format!("{}/content/slow.iso", server.uri()),
                    "filename": "slow.iso",
                }
            })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/content/slow.iso"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(30))
                .set_body_bytes(PAYLOAD.to_vec()),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let session = session_for(&server);
    let err = session
        .resolve_and_fetch(RetrievalRequest {
            deadline: Some(Duration::from_millis(100)),
            ..RetrievalRequest::for_hash(sum, dir.path())
        })
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Cancelled { .. }));

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert!(entries.is_empty(), "unexpected files: {entries:?}");
}

#[tokio::test]
async fn test_token_exchanged_once_across_operations() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "bearer-abc",
            "expires_in": 900
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(250)
        .mount(&server)
        .await;

    let session = session_for(&server);

    // Discovery probes plus a listing call all reuse the same bearer.
    let _ = session.discover_releases(Architecture::X86_64).await.unwrap();
    let images = session
        .list_content_set("rhel-9-x86_64-isos")
        .await
        .unwrap();
    assert!(images.is_empty());
}
