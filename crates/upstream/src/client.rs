//! Vendor API trait and its reqwest implementation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::headers::{BrowserProfile, FORM_CONTENT_TYPE};
use crate::request::{form, FilePart, RequestBody, SignedRequest};
use crate::response::{extract_task_id, extract_token, is_vendor_success, vendor_message, vendor_status};
use crate::sign::{Signature, Signer};
use crate::{
    BenefitLimits, ImageFacts, ImagePart, UploadReceipt, UploadRequest, UpstreamConfig,
    UpstreamError,
};

const OCTET_STREAM: &str = "application/octet-stream";

/// The vendor operations the gateway relies on.
///
/// Implemented over HTTP by [`HttpVendorClient`]; tests substitute fakes.
#[async_trait]
pub trait VendorApi: Send + Sync {
    /// Register a trial for the configured product. Callers treat this as best-effort.
    async fn send_trial(&self) -> Result<Value, UpstreamError>;

    /// Fetch the caller's current quota.
    async fn fetch_benefit_limits(&self, e_id: &str) -> Result<BenefitLimits, UpstreamError>;

    /// Fetch the quota and check `facts` against it.
    async fn check_benefit(
        &self,
        e_id: &str,
        facts: &ImageFacts,
    ) -> Result<BenefitLimits, UpstreamError> {
        let limits = self.fetch_benefit_limits(e_id).await?;
        limits.check(facts)?;
        Ok(limits)
    }

    /// Sign and upload an image/mask pair, returning the vendor token.
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, UpstreamError>;

    /// One status call right after upload. The task may not be queryable yet.
    async fn probe_initial_status(&self, token: &str, e_id: &str) -> Result<Value, UpstreamError>;

    /// Forward `token` to the polled status endpoint and return the raw reply.
    async fn query_status(&self, token: &str) -> Result<Value, UpstreamError>;
}

/// HTTP client for the vendor, sharing one connection pool across calls.
#[derive(Debug, Clone)]
pub struct HttpVendorClient {
    http: reqwest::Client,
    config: UpstreamConfig,
    signer: Signer,
    profile: BrowserProfile,
}

impl HttpVendorClient {
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        config.validate()?;
        let signer = Signer::new(config.sign_key.as_bytes(), config.sign_iv.as_bytes())?;
        let http = reqwest::Client::builder()
            .timeout(config.upload_timeout())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| UpstreamError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        let profile = BrowserProfile::from_config(&config);
        Ok(Self {
            http,
            config,
            signer,
            profile,
        })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    pub fn build_trial_request(&self) -> SignedRequest {
        SignedRequest::post(
            "trial",
            &self.config.endpoints.trial,
            self.profile.headers(Some(FORM_CONTENT_TYPE)),
        )
        .with_body(form([("p_id", self.config.product_id.as_str())]))
        .with_timeout(self.config.timeout())
    }

    pub fn build_benefit_request(&self, e_id: &str) -> SignedRequest {
        SignedRequest::post(
            "benefit_status",
            &self.config.endpoints.benefit_status,
            self.profile.headers(Some(FORM_CONTENT_TYPE)),
        )
        .with_body(form([
            ("e_id", e_id),
            ("product_id", self.config.product_id.as_str()),
        ]))
        .with_timeout(self.config.timeout())
    }

    pub fn build_upload_request(&self, request: &UploadRequest, signature: &Signature) -> SignedRequest {
        let fields = vec![
            ("sign".to_string(), signature.sign.clone()),
            ("name".to_string(), request.name.clone()),
            ("e_id".to_string(), request.e_id.clone()),
        ];
        let files = vec![
            file_part("img", &request.image),
            file_part("mask", &request.mask),
        ];
        SignedRequest::post("upload", &self.config.endpoints.upload, self.profile.headers(None))
            .with_body(RequestBody::Multipart { fields, files })
            .with_timeout(self.config.upload_timeout())
    }

    pub fn build_probe_request(&self, token: &str, e_id: &str) -> SignedRequest {
        SignedRequest::post(
            "wm_status",
            &self.config.endpoints.wm_status,
            self.profile.headers(Some(FORM_CONTENT_TYPE)),
        )
        .with_body(form([("token", token), ("e_id", e_id)]))
        .with_timeout(self.config.upload_timeout())
    }

    pub fn build_status_request(&self, token: &str) -> SignedRequest {
        SignedRequest::post(
            "poll_status",
            &self.config.endpoints.poll_status,
            self.profile.headers(Some(FORM_CONTENT_TYPE)),
        )
        .with_body(form([("token", token)]))
        .with_timeout(self.config.upload_timeout())
    }

    /// Send one request and decode its JSON reply.
    ///
    /// 5xx and transport failures become [`UpstreamError::Unavailable`], 4xx
    /// becomes [`UpstreamError::Rejected`] with the body attached.
    pub async fn send(&self, request: SignedRequest) -> Result<Value, UpstreamError> {
        let SignedRequest {
            operation,
            method,
            url,
            headers,
            body,
            timeout,
        } = request;

        let mut builder = self.http.request(method, &url).timeout(timeout);
        builder = match body {
            RequestBody::Form(pairs) => builder.form(&pairs),
            RequestBody::Multipart { fields, files } => builder.multipart(multipart_form(fields, files)),
        };
        // Applied after the body so our content type replaces reqwest's default.
        builder = builder.headers(headers);

        let response = builder.send().await.map_err(|e| {
            warn!(operation, url = %url, error = %e, "vendor request failed");
            UpstreamError::from_reqwest(e)
        })?;

        let status = response.status();
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!(operation, status = %status, body = %body, "vendor returned server error");
            return Err(UpstreamError::Unavailable(format!("HTTP {status}: {body}")));
        }
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            warn!(operation, status = %status, body = %body, "vendor rejected request");
            return Err(UpstreamError::Rejected {
                status: status.as_u16().to_string(),
                body,
            });
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(UpstreamError::from_reqwest)?;
        debug!(operation, response = %value, "vendor response");
        Ok(value)
    }
}

fn file_part(field: &str, part: &ImagePart) -> FilePart {
    FilePart {
        field: field.to_string(),
        filename: part.filename.clone().unwrap_or_else(|| field.to_string()),
        content_type: part
            .content_type
            .clone()
            .unwrap_or_else(|| OCTET_STREAM.to_string()),
        bytes: part.bytes.clone(),
    }
}

fn multipart_form(fields: Vec<(String, String)>, files: Vec<FilePart>) -> Form {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name, value);
    }
    for file in files {
        let build = || Part::bytes(file.bytes.to_vec()).file_name(file.filename.clone());
        let part = match build().mime_str(&file.content_type) {
            Ok(part) => part,
            Err(err) => {
                warn!(field = %file.field, error = %err, "invalid part content type, sending untyped");
                build()
            }
        };
        form = form.part(file.field, part);
    }
    form
}

#[async_trait]
impl VendorApi for HttpVendorClient {
    async fn send_trial(&self) -> Result<Value, UpstreamError> {
        self.send(self.build_trial_request()).await
    }

    async fn fetch_benefit_limits(&self, e_id: &str) -> Result<BenefitLimits, UpstreamError> {
        let value = self.send(self.build_benefit_request(e_id)).await?;
        let limits = BenefitLimits::from_status(&value);
        info!(e_id, ?limits, "benefit status fetched");
        Ok(limits)
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, UpstreamError> {
        let signature = self.signer.sign(&request.image.bytes);
        let signed = self.build_upload_request(&request, &signature);
        let value = self.send(signed).await?;

        info!(
            img_size = request.image.len(),
            mask_size = request.mask.len(),
            sign_len = signature.sign.len(),
            timestamp_ms = signature.timestamp_ms,
            name = %request.name,
            e_id = %request.e_id,
            vendor_status = ?vendor_status(&value),
            "upload request summary"
        );

        if !is_vendor_success(&value) {
            return Err(UpstreamError::Rejected {
                status: vendor_status(&value).unwrap_or_else(|| "missing".to_string()),
                body: vendor_message(&value)
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string()),
            });
        }

        let token = extract_token(&value)
            .ok_or_else(|| UpstreamError::MalformedResponse(format!("upload reply has no token: {value}")))?
            .to_string();
        Ok(UploadReceipt {
            token,
            task_id: extract_task_id(&value),
            raw: value,
        })
    }

    async fn probe_initial_status(&self, token: &str, e_id: &str) -> Result<Value, UpstreamError> {
        self.send(self.build_probe_request(token, e_id)).await
    }

    async fn query_status(&self, token: &str) -> Result<Value, UpstreamError> {
        self.send(self.build_status_request(token)).await
    }
}
