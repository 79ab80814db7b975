#![allow(dead_code)]

use async_trait::async_trait;
use image::{ImageFormat, RgbImage};
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gateway::{ClientInfo, Gateway, GatewayConfig, Submission};
use store::{CallStore, InMemoryCallStore};
use upstream::{
    BenefitLimits, ImagePart, UploadReceipt, UploadRequest, UpstreamError, VendorApi,
};

/// Scriptable vendor that counts every call.
pub struct FakeVendor {
    pub trial_calls: AtomicUsize,
    pub benefit_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub probe_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub benefit: Mutex<Result<BenefitLimits, UpstreamError>>,
    pub upload: Mutex<Result<UploadReceipt, UpstreamError>>,
    pub probe: Mutex<Result<Value, UpstreamError>>,
    pub status: Mutex<Result<Value, UpstreamError>>,
    pub trial: Mutex<Result<Value, UpstreamError>>,
    pub last_upload: Mutex<Option<UploadRequest>>,
}

impl FakeVendor {
    pub fn new() -> Self {
        Self {
            trial_calls: AtomicUsize::new(0),
            benefit_calls: AtomicUsize::new(0),
            upload_calls: AtomicUsize::new(0),
            probe_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            benefit: Mutex::new(Ok(BenefitLimits::default())),
            upload: Mutex::new(Ok(receipt("abc"))),
            probe: Mutex::new(Ok(json!({"status": "200"}))),
            status: Mutex::new(Ok(json!({"status": "200"}))),
            trial: Mutex::new(Ok(json!({"status": "200"}))),
            last_upload: Mutex::new(None),
        }
    }

    pub fn network_calls(&self) -> usize {
        self.trial_calls.load(Ordering::SeqCst)
            + self.benefit_calls.load(Ordering::SeqCst)
            + self.upload_calls.load(Ordering::SeqCst)
            + self.probe_calls.load(Ordering::SeqCst)
            + self.status_calls.load(Ordering::SeqCst)
    }

    pub fn set_benefit(&self, value: Result<BenefitLimits, UpstreamError>) {
        *self.benefit.lock().unwrap() = value;
    }

    pub fn set_upload(&self, value: Result<UploadReceipt, UpstreamError>) {
        *self.upload.lock().unwrap() = value;
    }

    pub fn set_probe(&self, value: Result<Value, UpstreamError>) {
        *self.probe.lock().unwrap() = value;
    }

    pub fn set_status(&self, value: Result<Value, UpstreamError>) {
        *self.status.lock().unwrap() = value;
    }

    pub fn set_trial(&self, value: Result<Value, UpstreamError>) {
        *self.trial.lock().unwrap() = value;
    }

    /// Wait until the detached probe has run.
    pub async fn wait_for_probe(&self) {
        for _ in 0..200 {
            if self.probe_calls.load(Ordering::SeqCst) > 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("initial status probe never ran");
    }
}

#[async_trait]
impl VendorApi for FakeVendor {
    async fn send_trial(&self) -> Result<Value, UpstreamError> {
        self.trial_calls.fetch_add(1, Ordering::SeqCst);
        self.trial.lock().unwrap().clone()
    }

    async fn fetch_benefit_limits(&self, _e_id: &str) -> Result<BenefitLimits, UpstreamError> {
        self.benefit_calls.fetch_add(1, Ordering::SeqCst);
        self.benefit.lock().unwrap().clone()
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, UpstreamError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_upload.lock().unwrap() = Some(request);
        self.upload.lock().unwrap().clone()
    }

    async fn probe_initial_status(&self, _token: &str, _e_id: &str) -> Result<Value, UpstreamError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.probe.lock().unwrap().clone()
    }

    async fn query_status(&self, _token: &str) -> Result<Value, UpstreamError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status.lock().unwrap().clone()
    }
}

pub fn receipt(token: &str) -> UploadReceipt {
    UploadReceipt {
        token: token.to_string(),
        task_id: Some("1".to_string()),
        raw: json!({"status": "200", "token": token, "taskId": "1"}),
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbImage::new(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

pub fn submission(image: Vec<u8>, mask: Vec<u8>) -> Submission {
    Submission {
        image: ImagePart::new(image)
            .with_filename("photo.png")
            .with_content_type("image/png"),
        mask: ImagePart::new(mask).with_content_type("image/png"),
        client: ClientInfo {
            ip: Some("203.0.113.7".to_string()),
            user_agent: Some("test-agent".to_string()),
        },
    }
}

pub struct Harness {
    pub vendor: Arc<FakeVendor>,
    pub store: Arc<InMemoryCallStore>,
    pub gateway: Gateway,
}

pub fn harness(config: GatewayConfig) -> Harness {
    let vendor = Arc::new(FakeVendor::new());
    let store = Arc::new(InMemoryCallStore::new());
    let gateway = Gateway::new(vendor.clone(), store.clone(), config);
    Harness {
        vendor,
        store,
        gateway,
    }
}

pub fn record_count(store: &dyn CallStore) -> usize {
    let mut count = 0;
    store
        .scan(&mut |_| {
            count += 1;
            Ok(())
        })
        .unwrap();
    count
}
