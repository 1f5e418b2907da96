//! Per-page overview assemblers.
//!
//! Each page fetches the collections it needs, runs them through the
//! aggregate/enrich/ranking/alerts primitives and returns one flat payload.
//! A failed fetch degrades the page to an empty payload plus a diagnostic.

pub mod articles;
pub mod dashboard;
pub mod operations;
pub mod personnel;
pub mod sanitary;
pub mod surveillance;

#[cfg(test)]
pub(crate) mod testing;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::data_api::DataSource;
use crate::error::{CollaboratorError, PageDiagnostic};
use crate::partners::PartnerSource;

/// The dashboard pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Dashboard,
    Personnel,
    Articles,
    Operations,
    Surveillance,
    Sanitaire,
}

impl Page {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Personnel => "personnel",
            Self::Articles => "articles",
            Self::Operations => "operations",
            Self::Surveillance => "surveillance",
            Self::Sanitaire => "sanitaire",
        }
    }
}

/// Outcome of one page computation.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PageResult<T> {
    Success { data: T },
    Degraded { diagnostic: PageDiagnostic },
}

impl<T: Serialize> PageResult<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data } => Some(data),
            Self::Degraded { .. } => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Flat metric-name → value mapping; empty for a degraded page.
    pub fn payload(&self) -> Map<String, Value> {
        let Self::Success { data } = self else {
            return Map::new();
        };
        match serde_json::to_value(data) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => {
                log::warn!("Failed to serialize page payload: {}", e);
                Map::new()
            }
        }
    }

    pub fn into_report(self, page: Page) -> PageReport {
        let data = self.payload();
        let (status, diagnostic) = match self {
            Self::Success { .. } => (PageStatus::Success, None),
            Self::Degraded { diagnostic } => (PageStatus::Degraded, Some(diagnostic)),
        };
        PageReport {
            status,
            page,
            computed_at: chrono::Utc::now().to_rfc3339(),
            data,
            diagnostic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Success,
    Degraded,
}

/// Type-erased page outcome handed to the rendering side.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReport {
    pub status: PageStatus,
    pub page: Page,
    pub computed_at: String,
    pub data: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<PageDiagnostic>,
}

/// Run one page computation, turning a collaborator failure into a degraded
/// result.
pub(crate) fn run_page<T>(
    page: Page,
    compute: impl FnOnce() -> Result<T, CollaboratorError>,
) -> PageResult<T> {
    match compute() {
        Ok(data) => {
            log::debug!("{} page computed", page.as_str());
            PageResult::Success { data }
        }
        Err(e) => {
            log::warn!("{} page degraded to an empty payload: {}", page.as_str(), e);
            PageResult::Degraded {
                diagnostic: PageDiagnostic::from(&e),
            }
        }
    }
}

/// Compute `page` against the given collaborators.
pub fn compute_page(page: Page, data: &dyn DataSource, partners: &dyn PartnerSource) -> PageReport {
    match page {
        Page::Dashboard => dashboard::dashboard_overview(data, partners).into_report(page),
        Page::Personnel => personnel::personnel_overview(data).into_report(page),
        Page::Articles => articles::articles_overview(data).into_report(page),
        Page::Operations => operations::operations_overview(data).into_report(page),
        Page::Surveillance => surveillance::surveillance_overview(data).into_report(page),
        Page::Sanitaire => sanitary::sanitary_overview(data).into_report(page),
    }
}

/// `{label, total}` style chart row, with the label key chosen per chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Labeled<V> {
    #[serde(flatten)]
    pub label: Map<String, Value>,
    pub total: V,
}

impl<V> Labeled<V> {
    pub fn new(key: &str, label: impl Into<Value>, total: V) -> Self {
        let mut map = Map::new();
        map.insert(key.to_string(), label.into());
        Self { label: map, total }
    }
}

/// Turn an ordered count map into `[{key: label, total}]` rows.
pub(crate) fn count_rows<K: Into<Value>>(
    key: &str,
    counts: impl IntoIterator<Item = (K, usize)>,
) -> Vec<Labeled<usize>> {
    counts
        .into_iter()
        .map(|(label, total)| Labeled::new(key, label, total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::testing::{FixturePartners, FixtureSource};
    use super::*;
    use crate::data_api::Collection;
    use serde_json::json;

    #[test]
    fn test_degraded_payload_is_empty() {
        let source = FixtureSource::default().failing(Collection::Personnel);
        let result = personnel::personnel_overview(&source);
        assert!(result.is_degraded());
        assert!(result.payload().is_empty());
        assert!(result.data().is_none());
    }

    #[test]
    fn test_report_shape() {
        let source = FixtureSource::default().with(Collection::Personnel, json!([{"etat": "actif"}]));
        let report = compute_page(Page::Personnel, &source, &FixturePartners::default());
        assert_eq!(report.status, PageStatus::Success);
        let value = serde_json::to_value(&report).expect("encode");
        assert_eq!(value["status"], "success");
        assert_eq!(value["page"], "personnel");
        assert_eq!(value["data"]["employes_actifs"], 1);
        assert!(value.get("computedAt").is_some());
        assert!(value.get("diagnostic").is_none());
    }

    #[test]
    fn test_degraded_report_carries_diagnostic() {
        let source = FixtureSource::default().failing(Collection::Surveillance);
        let report = compute_page(Page::Surveillance, &source, &FixturePartners::default());
        let value = serde_json::to_value(&report).expect("encode");
        assert_eq!(value["status"], "degraded");
        assert_eq!(value["data"], json!({}));
        assert_eq!(value["diagnostic"]["errorType"], "transient");
    }

    #[test]
    fn test_labeled_rows() {
        let rows = count_rows("service", vec![("achats", 2), ("rd", 1)]);
        let value = serde_json::to_value(&rows).expect("encode");
        assert_eq!(value, json!([{"service": "achats", "total": 2}, {"service": "rd", "total": 1}]));
    }
}
