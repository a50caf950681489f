use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use responder_core::config::BackendConfig;
use responder_core::models::{DispatchReport, IncidentIntakeRecord};
use responder_core::traits::ReportSink;
use responder_core::ResponderResult;

use crate::http::{build_client, ensure_success, transport_error};

const SERVICE: &str = "backend";

/// Posts flattened records to the back-office endpoint. Without a
/// configured URL records are only logged.
pub struct BackendReportSink {
    report_url: Option<String>,
    http: Client,
}

impl BackendReportSink {
    pub fn new(config: &BackendConfig) -> ResponderResult<Self> {
        Ok(Self {
            report_url: config.report_url.clone(),
            http: build_client(Duration::from_secs(config.timeout_seconds))?,
        })
    }

    async fn post<T: Serialize + Sync>(&self, record: &T) -> ResponderResult<()> {
        let Some(ref report_url) = self.report_url else {
            debug!("No backend report URL configured, skipping post");
            return Ok(());
        };
        let response = self
            .http
            .post(report_url)
            .json(record)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }
}

#[async_trait]
impl ReportSink for BackendReportSink {
    async fn report_dispatch(&self, report: &DispatchReport) -> ResponderResult<()> {
        self.post(report).await?;
        info!(kind = %report.kind, facility = %report.name, "dispatch reported");
        Ok(())
    }

    async fn report_incident(&self, record: &IncidentIntakeRecord) -> ResponderResult<()> {
        self.post(record).await?;
        info!(location = %record.location, "incident intake reported");
        Ok(())
    }
}
