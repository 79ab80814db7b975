mod common;

use std::sync::atomic::Ordering;

use common::{harness, png, receipt, record_count, submission};
use gateway::{BenefitPolicy, GatewayConfig, GatewayError};
use store::{CallRecord, CallStore};
use upstream::{BenefitLimits, UpstreamError};

#[tokio::test]
async fn successful_submit_returns_token_and_creates_one_record() {
    let h = harness(GatewayConfig::default());
    let image = vec![7u8; 2 * 1024 * 1024];
    let mask = vec![1u8; 1024];

    let receipt = h
        .gateway
        .submit(submission(image.clone(), mask.clone()))
        .await
        .unwrap();

    assert_eq!(receipt.token, "abc");
    assert!(!receipt.message.is_empty());
    assert_eq!(record_count(h.store.as_ref()), 1);

    let record = h.store.get("abc").unwrap().unwrap();
    assert_eq!(record.image, image);
    assert_eq!(record.mask, mask);
    assert_eq!(record.result_url, None);
    assert_eq!(record.e_id.len(), 32);
    assert_eq!(record.client_ip.as_deref(), Some("203.0.113.7"));
    assert_eq!(record.image_filename.as_deref(), Some("photo.png"));

    let upload = h.vendor.last_upload.lock().unwrap().clone().unwrap();
    assert_eq!(upload.name, "photo.png");
    assert_eq!(upload.e_id, record.e_id);

    h.vendor.wait_for_probe().await;
    assert_eq!(h.vendor.upload_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.vendor.trial_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn oversized_image_fails_locally_without_network_calls() {
    let h = harness(GatewayConfig {
        max_file_bytes: 1024,
        ..Default::default()
    });

    let err = h
        .gateway
        .submit(submission(vec![0; 2048], vec![0; 10]))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::InvalidInput(_)));
    assert_eq!(err.http_status_code(), 400);
    assert_eq!(h.vendor.network_calls(), 0);
    assert_eq!(record_count(h.store.as_ref()), 0);
}

#[tokio::test]
async fn unsupported_mask_type_is_invalid_input() {
    let h = harness(GatewayConfig::default());
    let mut sub = submission(png(4, 4), png(4, 4));
    sub.mask.content_type = Some("application/pdf".to_string());

    let err = h.gateway.submit(sub).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidInput(ref m) if m.contains("mask")));
    assert_eq!(h.vendor.network_calls(), 0);
}

#[tokio::test]
async fn resolution_over_limit_is_quota_exceeded_without_upload() {
    let h = harness(GatewayConfig::default());
    h.vendor.set_benefit(Ok(BenefitLimits {
        max_size_bytes: None,
        max_edge_px: Some(64),
    }));

    let err = h
        .gateway
        .submit(submission(png(200, 100), png(200, 100)))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::QuotaExceeded(ref m) if m.contains("200px")));
    assert_eq!(err.http_status_code(), 400);
    assert_eq!(h.vendor.benefit_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.vendor.upload_calls.load(Ordering::SeqCst), 0);
    assert_eq!(record_count(h.store.as_ref()), 0);
}

#[tokio::test]
async fn benefit_outage_fails_under_strict_policy() {
    let h = harness(GatewayConfig::default());
    h.vendor
        .set_benefit(Err(UpstreamError::Unavailable("connect refused".into())));

    let err = h
        .gateway
        .submit(submission(png(4, 4), png(4, 4)))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::UpstreamUnavailable(_)));
    assert_eq!(err.http_status_code(), 502);
    assert_eq!(h.vendor.upload_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn benefit_outage_is_skipped_under_best_effort_policy() {
    let h = harness(GatewayConfig {
        benefit_policy: BenefitPolicy::BestEffort,
        ..Default::default()
    });
    h.vendor
        .set_benefit(Err(UpstreamError::Unavailable("connect refused".into())));

    let receipt = h
        .gateway
        .submit(submission(png(4, 4), png(4, 4)))
        .await
        .unwrap();
    assert_eq!(receipt.token, "abc");
    assert_eq!(h.vendor.upload_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn trial_failure_is_not_fatal_and_can_be_disabled() {
    let h = harness(GatewayConfig::default());
    h.vendor
        .set_trial(Err(UpstreamError::Unavailable("timeout".into())));
    assert!(h.gateway.submit(submission(png(4, 4), png(4, 4))).await.is_ok());

    let h = harness(GatewayConfig {
        send_trial: false,
        ..Default::default()
    });
    h.gateway
        .submit(submission(png(4, 4), png(4, 4)))
        .await
        .unwrap();
    assert_eq!(h.vendor.trial_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upload_rejection_creates_no_record() {
    let h = harness(GatewayConfig::default());
    h.vendor.set_upload(Err(UpstreamError::Rejected {
        status: "500".into(),
        body: "sign invalid".into(),
    }));

    let err = h
        .gateway
        .submit(submission(png(4, 4), png(4, 4)))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::UpstreamRejected { .. }));
    assert_eq!(record_count(h.store.as_ref()), 0);
    assert_eq!(h.vendor.probe_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn probe_failure_does_not_fail_submission() {
    let h = harness(GatewayConfig::default());
    h.vendor
        .set_probe(Err(UpstreamError::Unavailable("timeout".into())));

    let receipt = h
        .gateway
        .submit(submission(png(4, 4), png(4, 4)))
        .await
        .unwrap();

    h.vendor.wait_for_probe().await;
    assert_eq!(receipt.token, "abc");
    assert!(h.store.exists("abc").unwrap());
}

#[tokio::test]
async fn duplicate_token_is_reported_and_keeps_original() {
    let h = harness(GatewayConfig::default());
    h.store
        .create(CallRecord::new("abc", "earlier", vec![9], vec![9]))
        .unwrap();
    h.vendor.set_upload(Ok(receipt("abc")));

    let err = h
        .gateway
        .submit(submission(png(4, 4), png(4, 4)))
        .await
        .unwrap_err();

    assert_eq!(err, GatewayError::DuplicateToken("abc".into()));
    assert_eq!(h.store.get("abc").unwrap().unwrap().e_id, "earlier");
    assert_eq!(h.vendor.probe_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dimensions_are_recorded_when_readable() {
    let h = harness(GatewayConfig::default());
    h.gateway
        .submit(submission(png(40, 30), png(40, 30)))
        .await
        .unwrap();

    let record = h.store.get("abc").unwrap().unwrap();
    assert_eq!((record.image_width, record.image_height), (Some(40), Some(30)));
}

#[tokio::test]
async fn unnamed_image_uploads_under_fallback_name() {
    let h = harness(GatewayConfig::default());
    let mut unnamed = submission(png(8, 8), png(8, 8));
    unnamed.image.filename = None;

    h.gateway.submit(unnamed).await.unwrap();

    let upload = h.vendor.last_upload.lock().unwrap().clone().unwrap();
    assert_eq!(upload.name, "uploaded_image");
    assert_eq!(h.store.get("abc").unwrap().unwrap().image_filename, None);
}
