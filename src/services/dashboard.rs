//! Global dashboard: one headline KPI per service, two partner lookups and
//! four cross-domain charts.

use serde::Serialize;
use serde_json::Value;

use super::surveillance::{incident_series, IncidentSeries};
use super::{count_rows, run_page, Labeled, Page, PageResult};
use crate::aggregate::{count_where, group_count, min_by};
use crate::alerts::{is_fire, is_in_progress, is_packaging_ok, is_quality_problem, zone_means};
use crate::data_api::{fetch, DataSource};
use crate::error::CollaboratorError;
use crate::partners::formations::resolve_best_formation;
use crate::partners::{oldest_drone, Formation, PartnerSource};
use crate::records::{
    Article, CommercialOperation, Personnel, SanitaryReading, SurveillanceRecord, UNKNOWN_LABEL,
};
use crate::util::zone_label;

const SERVICE_PURCHASING: &str = "achats";
const SERVICE_SALES: &str = "commercial";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchasingKpi {
    pub nb_employes_achats: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesManagersKpi {
    pub total: usize,
}

/// Reading with the lowest CO2. Both fields are null when there is no reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistanceKpi {
    pub zone: Option<i64>,
    pub co2: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceKpi {
    pub incendies_actifs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchKpi {
    pub articles_deformes_sans_collision: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityKpi {
    pub articles_emballage_correct: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationsKpi {
    pub operations_en_cours: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneCo2 {
    pub zone: String,
    pub co2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOverview {
    pub achats: PurchasingKpi,
    pub resp_vente: SalesManagersKpi,
    pub assistance: AssistanceKpi,
    pub maintenance: MaintenanceKpi,
    pub rd: ResearchKpi,
    pub qualite: QualityKpi,
    pub operations: OperationsKpi,
    pub formation_meilleure: Formation,
    pub drone_plus_ancien: Option<Value>,
    pub personnel_services: Vec<Labeled<usize>>,
    pub articles_emballage: Vec<Labeled<usize>>,
    pub co_zones: Vec<ZoneCo2>,
    pub incidents_types: IncidentSeries,
}

/// One snapshot of every collection the dashboard reads.
pub struct DashboardSnapshot {
    pub personnel: Vec<Personnel>,
    pub surveillance: Vec<SurveillanceRecord>,
    pub articles: Vec<Article>,
    pub readings: Vec<SanitaryReading>,
    pub operations: Vec<CommercialOperation>,
}

impl DashboardSnapshot {
    pub fn fetch(source: &dyn DataSource) -> Result<Self, CollaboratorError> {
        Ok(Self {
            personnel: fetch(source)?,
            surveillance: fetch(source)?,
            articles: fetch(source)?,
            readings: fetch(source)?,
            operations: fetch(source)?,
        })
    }
}

fn assistance(readings: &[SanitaryReading]) -> AssistanceKpi {
    match min_by(readings, |r| r.co2.unwrap_or(f64::INFINITY)) {
        Some(best) => AssistanceKpi {
            zone: best.zone,
            co2: best.co2,
        },
        None => AssistanceKpi { zone: None, co2: None },
    }
}

/// Build the dashboard from a snapshot and the two partner answers.
pub fn compute_dashboard(
    snapshot: &DashboardSnapshot,
    formation_meilleure: Formation,
    drone_plus_ancien: Option<Value>,
) -> DashboardOverview {
    let DashboardSnapshot {
        personnel,
        surveillance,
        articles,
        readings,
        operations,
    } = snapshot;

    let nb_employes_achats = count_where(personnel, |p| p.service.as_deref() == Some(SERVICE_PURCHASING));
    let nb_resp_vente = count_where(personnel, |p| {
        p.service.as_deref() == Some(SERVICE_SALES) && p.is_manager()
    });

    let services = group_count(personnel, |p| p.service.as_deref(), UNKNOWN_LABEL);
    let packaging = group_count(articles, |a| a.etat_emballage.as_deref(), UNKNOWN_LABEL);

    let co_zones = zone_means(readings, SanitaryReading::co2)
        .into_iter()
        .map(|(zone, co2)| ZoneCo2 {
            zone: zone_label(zone),
            co2,
        })
        .collect();

    DashboardOverview {
        achats: PurchasingKpi { nb_employes_achats },
        resp_vente: SalesManagersKpi { total: nb_resp_vente },
        assistance: assistance(readings),
        maintenance: MaintenanceKpi {
            incendies_actifs: count_where(surveillance, is_fire),
        },
        rd: ResearchKpi {
            articles_deformes_sans_collision: count_where(articles, is_quality_problem),
        },
        qualite: QualityKpi {
            articles_emballage_correct: count_where(articles, is_packaging_ok),
        },
        operations: OperationsKpi {
            operations_en_cours: count_where(operations, is_in_progress),
        },
        formation_meilleure,
        drone_plus_ancien,
        personnel_services: count_rows("service", services),
        articles_emballage: count_rows("emballage", packaging),
        co_zones,
        incidents_types: incident_series(surveillance),
    }
}

/// Fetch everything and build the dashboard. Partners are only called once
/// the data snapshot is complete; their failures never degrade the page.
pub fn dashboard_overview(
    source: &dyn DataSource,
    partners: &dyn PartnerSource,
) -> PageResult<DashboardOverview> {
    run_page(Page::Dashboard, || {
        let snapshot = DashboardSnapshot::fetch(source)?;
        let drone = oldest_drone(partners);
        let formation = resolve_best_formation(partners);
        Ok(compute_dashboard(&snapshot, formation, drone))
    })
}
