//! Server-rendered PDF reports.
//!
//! The server builds every report; the client only downloads the bytes and
//! writes them where the user asked.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::api::ApiClient;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Report {
    TrialBalance,
    BalanceSheet,
    ProfitLoss,
    CashFlow,
}

impl Report {
    pub fn path(self) -> &'static str {
        match self {
            Report::TrialBalance => "/api/document/trial_balance/",
            Report::BalanceSheet => "/api/document/balance_sheet/",
            Report::ProfitLoss => "/api/document/profit_loss/",
            Report::CashFlow => "/api/document/cash_flow/",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Report::TrialBalance => "trial_balance.pdf",
            Report::BalanceSheet => "balance_sheet.pdf",
            Report::ProfitLoss => "profit_loss.pdf",
            Report::CashFlow => "cash_flow.pdf",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Report::TrialBalance => "Trial Balance",
            Report::BalanceSheet => "Balance Sheet",
            Report::ProfitLoss => "Profit & Loss",
            Report::CashFlow => "Cash Flow",
        }
    }
}

pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}

pub async fn fetch(api: &ApiClient, report: Report) -> Result<Vec<u8>> {
    api.get_bytes(report.path(), "Failed to load report.").await
}

/// Download `report` to `output` (or its default file name), returning the
/// path written and its size.
pub async fn download(
    api: &ApiClient,
    report: Report,
    output: Option<&Path>,
) -> Result<(PathBuf, u64)> {
    let bytes = fetch(api, report).await?;
    if !looks_like_pdf(&bytes) {
        tracing::warn!(report = report.file_name(), "response does not look like a PDF");
    }
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(report.file_name()));
    fs::write(&path, &bytes)?;
    Ok((path, bytes.len() as u64))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::fake::FakeTransport;
    use crate::api::Method;

    #[tokio::test]
    async fn test_download_writes_pdf_bytes() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond_raw(Method::Get, Report::TrialBalance.path(), 200, b"%PDF-1.4 body");
        let api = ApiClient::new(fake);

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("tb.pdf");
        let (path, size) = download(&api, Report::TrialBalance, Some(&target)).await.unwrap();

        assert_eq!(path, target);
        assert_eq!(size, 13);
        assert_eq!(fs::read(&target).unwrap(), b"%PDF-1.4 body");
    }

    #[tokio::test]
    async fn test_failed_download_writes_nothing() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond_raw(Method::Get, Report::BalanceSheet.path(), 500, b"");
        let api = ApiClient::new(fake);

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("bs.pdf");
        let err = download(&api, Report::BalanceSheet, Some(&target)).await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to load report. (HTTP 500)");
        assert!(!target.exists());
    }

    #[test]
    fn test_default_file_names() {
        assert_eq!(Report::TrialBalance.file_name(), "trial_balance.pdf");
        assert_eq!(Report::CashFlow.path(), "/api/document/cash_flow/");
        assert!(looks_like_pdf(b"%PDF-1.7"));
        assert!(!looks_like_pdf(b"<html>"));
    }
}
