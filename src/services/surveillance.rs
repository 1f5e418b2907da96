use serde::Serialize;

use super::{count_rows, run_page, Labeled, Page, PageResult};
use crate::aggregate::{
    count_where, group_count, max_by, min_by, percentage, ratio, saturating_total, sum_int_by,
};
use crate::alerts::{
    has_drone_failure, has_suspect_shape, is_compliant, is_critical_drone_failure, is_fire,
    is_non_compliant, is_urgent,
};
use crate::data_api::{fetch, DataSource};
use crate::ranking::bottom;
use crate::records::{SurveillanceRecord, NO_SHAPE};
use crate::util::{round_to, zone_label};

/// Incident counts by type, in a fixed label order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentSeries {
    pub labels: [&'static str; 3],
    pub values: [usize; 3],
}

pub fn incident_series(surveillance: &[SurveillanceRecord]) -> IncidentSeries {
    IncidentSeries {
        labels: ["Incendie", "Panne drone", "Audit non conforme"],
        values: [
            count_where(surveillance, is_fire),
            count_where(surveillance, has_drone_failure),
            count_where(surveillance, is_non_compliant),
        ],
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneActiveDrones {
    pub zone: String,
    pub actifs: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZonesComparison {
    pub zones: Vec<String>,
    pub actifs: Vec<i64>,
    pub panne: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FireAlert {
    pub zone: Option<i64>,
    pub drones_actifs: i64,
    pub detection_forme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroneFailureAlert {
    pub zone: Option<i64>,
    pub drones_panne: i64,
    pub drones_actifs: i64,
    pub total_drones: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditAlert {
    pub zone: Option<i64>,
    pub detection_forme: Option<String>,
    pub drones_actifs: i64,
    pub detection_incendie: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeAlert {
    pub zone: Option<i64>,
    pub detection_forme: Option<String>,
    pub drones_actifs: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveillanceOverview {
    pub total_zones: usize,
    pub zones_incendie: usize,
    pub total_drones_actifs: i64,
    pub total_drones_panne: i64,
    pub total_drones_rechargement: i64,
    pub taux_conformite: f64,
    pub taux_operationnel: f64,
    pub zones_conformes: usize,
    pub graphique_incidents: IncidentSeries,
    pub graphique_drones: Vec<Labeled<i64>>,
    pub graphique_formes: Vec<Labeled<usize>>,
    pub graphique_conformite: Vec<Labeled<usize>>,
    pub graphique_drones_zones: Vec<ZoneActiveDrones>,
    pub zones_comparison: ZonesComparison,
    pub zones_incendie_list: Vec<FireAlert>,
    pub zones_panne_critique: Vec<DroneFailureAlert>,
    pub zones_non_conformes: Vec<AuditAlert>,
    pub zones_forme_suspecte: Vec<ShapeAlert>,
    pub zones_urgentes: Vec<SurveillanceRecord>,
    pub zone_max_drones: Option<SurveillanceRecord>,
    pub zone_min_drones: Option<SurveillanceRecord>,
    pub moyenne_drones_actifs: f64,
}

fn alerts<'a, A>(
    surveillance: &'a [SurveillanceRecord],
    rule: impl Fn(&SurveillanceRecord) -> bool,
    build: impl Fn(&'a SurveillanceRecord) -> A,
) -> Vec<A> {
    surveillance.iter().filter(|z| rule(z)).map(build).collect()
}

pub fn compute_surveillance(surveillance: &[SurveillanceRecord]) -> SurveillanceOverview {
    let total_zones = surveillance.len();
    let zones_incendie = count_where(surveillance, is_fire);
    let zones_conformes = count_where(surveillance, is_compliant);

    let total_drones_actifs = sum_int_by(surveillance, SurveillanceRecord::active_drones);
    let total_drones_panne = sum_int_by(surveillance, SurveillanceRecord::failed_drones);
    let total_drones_rechargement = sum_int_by(surveillance, SurveillanceRecord::charging_drones);
    let total_drones =
        saturating_total([total_drones_actifs, total_drones_panne, total_drones_rechargement]);

    // Stable sort on a copy: records sharing a zone keep their input order.
    let by_zone = bottom(surveillance, |z| z.zone_id() as f64, surveillance.len());

    SurveillanceOverview {
        total_zones,
        zones_incendie,
        total_drones_actifs,
        total_drones_panne,
        total_drones_rechargement,
        taux_conformite: round_to(percentage(zones_conformes as f64, total_zones as f64), 1),
        taux_operationnel: round_to(
            percentage(total_drones_actifs as f64, total_drones as f64),
            1,
        ),
        zones_conformes,
        graphique_incidents: incident_series(surveillance),
        graphique_drones: vec![
            Labeled::new("etat", "Actifs", total_drones_actifs),
            Labeled::new("etat", "En panne", total_drones_panne),
            Labeled::new("etat", "En rechargement", total_drones_rechargement),
        ],
        graphique_formes: count_rows(
            "forme",
            group_count(surveillance, |z| z.detection_forme.as_deref(), NO_SHAPE),
        ),
        graphique_conformite: vec![
            Labeled::new("etat", "Conforme", zones_conformes),
            Labeled::new("etat", "Non conforme", total_zones - zones_conformes),
        ],
        graphique_drones_zones: by_zone
            .iter()
            .map(|z| ZoneActiveDrones {
                zone: zone_label(z.zone_id()),
                actifs: z.active_drones(),
            })
            .collect(),
        zones_comparison: ZonesComparison {
            zones: by_zone.iter().map(|z| zone_label(z.zone_id())).collect(),
            actifs: by_zone.iter().map(SurveillanceRecord::active_drones).collect(),
            panne: by_zone.iter().map(SurveillanceRecord::failed_drones).collect(),
        },
        zones_incendie_list: alerts(surveillance, is_fire, |z| FireAlert {
            zone: z.zone,
            drones_actifs: z.active_drones(),
            detection_forme: z.detection_forme.clone(),
        }),
        zones_panne_critique: alerts(surveillance, is_critical_drone_failure, |z| DroneFailureAlert {
            zone: z.zone,
            drones_panne: z.failed_drones(),
            drones_actifs: z.active_drones(),
            total_drones: z.total_drones(),
        }),
        zones_non_conformes: alerts(surveillance, is_non_compliant, |z| AuditAlert {
            zone: z.zone,
            detection_forme: z.detection_forme.clone(),
            drones_actifs: z.active_drones(),
            detection_incendie: z.detection_incendie.clone(),
        }),
        zones_forme_suspecte: alerts(surveillance, has_suspect_shape, |z| ShapeAlert {
            zone: z.zone,
            detection_forme: z.detection_forme.clone(),
            drones_actifs: z.active_drones(),
        }),
        zones_urgentes: alerts(surveillance, is_urgent, SurveillanceRecord::clone),
        zone_max_drones: max_by(surveillance, |z| z.active_drones() as f64).cloned(),
        zone_min_drones: min_by(surveillance, |z| z.active_drones() as f64).cloned(),
        moyenne_drones_actifs: round_to(ratio(total_drones_actifs as f64, total_zones as f64), 1),
    }
}

pub fn surveillance_overview(source: &dyn DataSource) -> PageResult<SurveillanceOverview> {
    run_page(Page::Surveillance, || {
        let surveillance: Vec<SurveillanceRecord> = fetch(source)?;
        Ok(compute_surveillance(&surveillance))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_api::Collection;
    use crate::services::testing::FixtureSource;
    use serde_json::{json, Value};

    fn records(value: Value) -> Vec<SurveillanceRecord> {
        serde_json::from_value(value).expect("surveillance fixture")
    }

    fn sample() -> Vec<SurveillanceRecord> {
        records(json!([
            {"zone": 3, "detection_incendie": "non", "drones_actifs": 4, "drones_panne": 0,
             "drones_rechargement": 1, "audit_conformite": "oui", "detection_forme": "aucune"},
            {"zone": 1, "detection_incendie": "oui", "drones_actifs": 2, "drones_panne": 1,
             "drones_rechargement": 0, "audit_conformite": "oui", "detection_forme": "humaine"},
            {"zone": 2, "detection_incendie": "non", "drones_actifs": 1, "drones_panne": 3,
             "drones_rechargement": 1, "audit_conformite": "non"}
        ]))
    }

    #[test]
    fn test_fire_and_failure_are_both_urgent() {
        let overview = compute_surveillance(&records(json!([
            {"zone": 1, "detection_incendie": "oui", "drones_panne": 1},
            {"zone": 2, "detection_incendie": "non", "drones_panne": 2}
        ])));
        assert_eq!(overview.zones_incendie, 1);
        let urgent: Vec<i64> = overview.zones_urgentes.iter().map(SurveillanceRecord::zone_id).collect();
        assert_eq!(urgent, vec![1, 2]);
    }

    #[test]
    fn test_totals_and_rates() {
        let overview = compute_surveillance(&sample());
        assert_eq!(overview.total_zones, 3);
        assert_eq!(overview.total_drones_actifs, 7);
        assert_eq!(overview.total_drones_panne, 4);
        assert_eq!(overview.total_drones_rechargement, 2);
        assert_eq!(overview.zones_conformes, 2);
        assert_eq!(overview.taux_conformite, 66.7);
        // 7 / 13
        assert_eq!(overview.taux_operationnel, 53.8);
        assert_eq!(overview.moyenne_drones_actifs, 2.3);
    }

    #[test]
    fn test_oversized_drone_counts_saturate() {
        let overview = compute_surveillance(&records(json!([
            {"zone": 1, "drones_actifs": i64::MAX, "drones_panne": 3},
            {"zone": 2, "drones_actifs": 1},
        ])));
        assert_eq!(overview.total_drones_actifs, i64::MAX);
        assert_eq!(overview.total_drones_panne, 3);
        let value = serde_json::to_value(&overview).expect("encode");
        assert_eq!(value["zones_panne_critique"][0]["total_drones"], i64::MAX);
    }

    #[test]
    fn test_charts() {
        let value = serde_json::to_value(compute_surveillance(&sample())).expect("encode");
        assert_eq!(value["graphique_incidents"]["values"], json!([1, 2, 1]));
        assert_eq!(
            value["graphique_drones"],
            json!([
                {"etat": "Actifs", "total": 7},
                {"etat": "En panne", "total": 4},
                {"etat": "En rechargement", "total": 2}
            ])
        );
        assert_eq!(
            value["graphique_formes"],
            json!([{"forme": "aucune", "total": 2}, {"forme": "humaine", "total": 1}])
        );
        assert_eq!(
            value["graphique_conformite"],
            json!([{"etat": "Conforme", "total": 2}, {"etat": "Non conforme", "total": 1}])
        );
        assert_eq!(
            value["zones_comparison"],
            json!({"zones": ["Zone 1", "Zone 2", "Zone 3"], "actifs": [2, 1, 4], "panne": [1, 3, 0]})
        );
        assert_eq!(value["graphique_drones_zones"][0], json!({"zone": "Zone 1", "actifs": 2}));
    }

    #[test]
    fn test_alert_lists() {
        let value = serde_json::to_value(compute_surveillance(&sample())).expect("encode");
        assert_eq!(
            value["zones_incendie_list"],
            json!([{"zone": 1, "drones_actifs": 2, "detection_forme": "humaine"}])
        );
        assert_eq!(
            value["zones_panne_critique"],
            json!([{"zone": 2, "drones_panne": 3, "drones_actifs": 1, "total_drones": 5}])
        );
        assert_eq!(
            value["zones_non_conformes"],
            json!([{"zone": 2, "detection_forme": null, "drones_actifs": 1, "detection_incendie": "non"}])
        );
        assert_eq!(
            value["zones_forme_suspecte"],
            json!([{"zone": 1, "detection_forme": "humaine", "drones_actifs": 2}])
        );
        assert_eq!(value["zones_urgentes"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_drone_extremes() {
        let overview = compute_surveillance(&sample());
        assert_eq!(overview.zone_max_drones.map(|z| z.zone_id()), Some(3));
        assert_eq!(overview.zone_min_drones.map(|z| z.zone_id()), Some(2));
        let empty = compute_surveillance(&[]);
        assert!(empty.zone_max_drones.is_none());
        assert_eq!(empty.taux_operationnel, 0.0);
        assert_eq!(empty.moyenne_drones_actifs, 0.0);
    }

    #[test]
    fn test_overview_degrades_on_failure() {
        let source = FixtureSource::default().failing(Collection::Surveillance);
        let result = surveillance_overview(&source);
        assert!(result.is_degraded());
        assert!(result.payload().is_empty());
    }
}
