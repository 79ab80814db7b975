use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use upstream::{extract_result_url, generate_e_id, UploadRequest, UpstreamError};

use store::CallRecord;

use crate::gateway::timed;
use crate::metrics::{record_probe, record_submit};
use crate::validate::{image_facts, validate_part};
use crate::{BenefitPolicy, Gateway, GatewayError, Submission, SubmitReceipt};

/// Name sent to the vendor when the client gave no filename.
const FALLBACK_NAME: &str = "uploaded_image";

impl Gateway {
    /// Validate, check quota, upload, persist, then fire the initial probe.
    ///
    /// The returned token is only issued once the local record exists. The
    /// probe runs detached and never affects the result.
    pub async fn submit(&self, submission: Submission) -> Result<SubmitReceipt, GatewayError> {
        let result = self.run_submit(submission).await;
        record_submit(result.as_ref().map(|_| ()));
        result
    }

    async fn run_submit(&self, submission: Submission) -> Result<SubmitReceipt, GatewayError> {
        let Submission { image, mask, client } = submission;

        validate_part("img", &image, &self.config)?;
        validate_part("mask", &mask, &self.config)?;
        let facts = image_facts(&image);

        if self.config.send_trial {
            if let Err(err) = timed("trial", self.vendor.send_trial()).await {
                warn!(error = %err, "trial request failed, continuing");
            }
        }

        let e_id = generate_e_id();
        match timed("benefit_status", self.vendor.check_benefit(&e_id, &facts)).await {
            Ok(limits) => debug!(e_id = %e_id, ?limits, ?facts, "benefit check passed"),
            Err(UpstreamError::QuotaExceeded(msg)) => {
                warn!(e_id = %e_id, stage = "benefit", reason = %msg, "quota exceeded");
                return Err(GatewayError::QuotaExceeded(msg));
            }
            Err(err) if self.config.benefit_policy == BenefitPolicy::Strict => {
                error!(e_id = %e_id, stage = "benefit", error = %err, "benefit check failed");
                return Err(err.into());
            }
            Err(err) => {
                warn!(e_id = %e_id, stage = "benefit", error = %err, "benefit check unavailable, skipping");
            }
        }

        let request = UploadRequest {
            image: image.clone(),
            mask: mask.clone(),
            name: image
                .filename
                .clone()
                .unwrap_or_else(|| FALLBACK_NAME.to_string()),
            e_id: e_id.clone(),
        };
        let receipt = timed("upload", self.vendor.upload(request))
            .await
            .map_err(|err| {
                error!(e_id = %e_id, stage = "upload", error = %err, "upload failed");
                GatewayError::from(err)
            })?;
        let token = receipt.token;

        let (width, height) = facts.dimensions.unzip();
        let mut record = CallRecord::new(&token, &e_id, image.bytes.to_vec(), mask.bytes.to_vec());
        record.client_ip = client.ip;
        record.user_agent = client.user_agent;
        record.image_filename = image.filename;
        record.image_content_type = image.content_type;
        record.image_width = width;
        record.image_height = height;

        self.with_store(move |store| store.create(record))
            .await
            .map_err(|err| {
                error!(token = %token, e_id = %e_id, stage = "persist", error = %err, "failed to store call record");
                err
            })?;

        self.spawn_probe(token.clone(), e_id.clone());
        info!(token = %token, e_id = %e_id, task_id = ?receipt.task_id, "erase request submitted");

        Ok(SubmitReceipt {
            token,
            message: self.config.submit_message.clone(),
        })
    }

    fn spawn_probe(&self, token: String, e_id: String) -> JoinHandle<()> {
        let vendor = self.vendor.clone();
        tokio::spawn(async move {
            match timed("wm_status", vendor.probe_initial_status(&token, &e_id)).await {
                Ok(reply) => {
                    record_probe(true);
                    info!(
                        token = %token,
                        result_url = ?extract_result_url(&reply),
                        "initial status probe answered"
                    );
                }
                Err(err) => {
                    record_probe(false);
                    warn!(token = %token, e_id = %e_id, stage = "probe", error = %err, "initial status probe failed");
                }
            }
        })
    }
}
