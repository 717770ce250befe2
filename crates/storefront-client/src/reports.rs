//! Read-only report queries: the daily cash/UPI summary and sales rows.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storefront_core::money::{self, Money};
use storefront_core::{PaymentMode, ValidationError};
use tracing::debug;

use crate::api::{decode_envelope, Envelope, HttpTransport};
use crate::error::{ClientError, ClientResult};
use crate::session::SessionManager;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Takings per payment mode over a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub cash: Money,
    pub upi: Money,
    pub total: Money,
}

#[derive(Debug, Deserialize)]
struct WireSummary {
    #[serde(default, alias = "cashTotal", alias = "totalCash", with = "money::major_units::option")]
    cash: Option<Money>,
    #[serde(default, alias = "upiTotal", alias = "totalUpi", with = "money::major_units::option")]
    upi: Option<Money>,
    #[serde(default, alias = "totalAmount", with = "money::major_units::option")]
    total: Option<Money>,
}

impl From<WireSummary> for DailySummary {
    fn from(wire: WireSummary) -> Self {
        let cash = wire.cash.unwrap_or_default();
        let upi = wire.upi.unwrap_or_default();
        DailySummary {
            cash,
            upi,
            total: wire.total.unwrap_or(cash + upi),
        }
    }
}

/// Optional filters for `/sales/fetch`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub product_id: Option<i64>,
    pub payment_mode: Option<PaymentMode>,
}

impl SalesFilter {
    fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(start) = self.start {
            query.push(("startDate".to_string(), start.format(DATE_FORMAT).to_string()));
        }
        if let Some(end) = self.end {
            query.push(("endDate".to_string(), end.format(DATE_FORMAT).to_string()));
        }
        if let Some(id) = self.product_id {
            query.push(("productId".to_string(), id.to_string()));
        }
        if let Some(mode) = self.payment_mode {
            query.push(("paymentMode".to_string(), mode.to_string()));
        }
        query
    }
}

/// One sold line as the report endpoint lists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReportRow {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, alias = "product", alias = "name")]
    pub product_name: String,
    #[serde(default)]
    pub flavour_name: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default, with = "money::major_units::option")]
    pub amount: Option<Money>,
    #[serde(default)]
    pub payment_mode: Option<String>,
    #[serde(default, alias = "createdAt", alias = "date")]
    pub sold_at: Option<String>,
}

pub struct ReportsClient {
    http: Arc<dyn HttpTransport>,
    session: Arc<SessionManager>,
}

impl ReportsClient {
    pub fn new(http: Arc<dyn HttpTransport>, session: Arc<SessionManager>) -> Self {
        ReportsClient { http, session }
    }

    /// `GET /orders/summary?start=&end=` (dates inclusive).
    pub async fn daily_summary(&self, start: NaiveDate, end: NaiveDate) -> ClientResult<DailySummary> {
        if end < start {
            return Err(ClientError::Validation(ValidationError::InvalidFormat {
                field: "date range".to_string(),
                reason: format!("ends ({}) before it starts ({})", end, start),
            }));
        }
        let query = vec![
            ("start".to_string(), start.format(DATE_FORMAT).to_string()),
            ("end".to_string(), end.format(DATE_FORMAT).to_string()),
        ];
        let summary: WireSummary = self.fetch("/orders/summary", &query).await?;
        Ok(summary.into())
    }

    /// `GET /sales/fetch` with the given filters.
    pub async fn sales(&self, filter: &SalesFilter) -> ClientResult<Vec<SaleReportRow>> {
        let rows: Vec<SaleReportRow> = self.fetch("/sales/fetch", &filter.query()).await?;
        debug!(rows = rows.len(), "Sales report fetched");
        Ok(rows)
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, query: &[(String, String)]) -> ClientResult<T> {
        let token = self.session.access_token().await?;
        let response = self.http.get(path, query, Some(&token)).await?;
        match decode_envelope::<T>(&response.body) {
            Envelope::Success(data) => Ok(data),
            Envelope::Failure { message } => Err(ClientError::submission(Some(response.status), message)),
        }
    }
}

impl std::fmt::Debug for ReportsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportsClient").finish_non_exhaustive()
    }
}
