//! Threshold rules that turn raw records into alert lists.
//!
//! Record rules are pure predicates over a single record. Zone rules are two
//! pass: average every zone first, then keep the zones whose mean crosses the
//! threshold.

use std::collections::BTreeMap;

use crate::aggregate::group_average;
use crate::records::{
    Article, CommercialOperation, Personnel, SanitaryReading, SurveillanceRecord, NO, NO_SHAPE,
    OPERATION_IN_PROGRESS, PACKAGING_DEFORMED, PACKAGING_OK, STATE_SICK_LEAVE, YES,
};

pub const CRITICAL_DRONE_FAILURES: i64 = 2;
pub const OPTIMAL_TEMPERATURE: (f64, f64) = (21.0, 24.0);
pub const OPTIMAL_HUMIDITY: (f64, f64) = (45.0, 55.0);
pub const TEMPERATURE_LIMIT: f64 = 25.0;
pub const CO2_LIMIT: f64 = 0.06;
pub const PM2_5_LIMIT: f64 = 0.03;
pub const HUMIDITY_DRY_BELOW: f64 = 40.0;
pub const HUMIDITY_WET_ABOVE: f64 = 60.0;

// ---------------------------------------------------------------------------
// Surveillance
// ---------------------------------------------------------------------------

pub fn is_fire(zone: &SurveillanceRecord) -> bool {
    zone.fire_detected()
}

pub fn has_drone_failure(zone: &SurveillanceRecord) -> bool {
    zone.failed_drones() > 0
}

pub fn is_critical_drone_failure(zone: &SurveillanceRecord) -> bool {
    zone.failed_drones() >= CRITICAL_DRONE_FAILURES
}

pub fn is_compliant(zone: &SurveillanceRecord) -> bool {
    zone.audit() == YES
}

pub fn is_non_compliant(zone: &SurveillanceRecord) -> bool {
    zone.audit() == NO
}

pub fn has_suspect_shape(zone: &SurveillanceRecord) -> bool {
    !matches!(zone.shape(), NO_SHAPE | "")
}

/// Fire, critical drone failure or failed audit.
pub fn is_urgent(zone: &SurveillanceRecord) -> bool {
    is_fire(zone) || is_critical_drone_failure(zone) || is_non_compliant(zone)
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

pub fn is_packaging_ok(article: &Article) -> bool {
    article.packaging() == PACKAGING_OK
}

pub fn is_deformed(article: &Article) -> bool {
    article.packaging() == PACKAGING_DEFORMED
}

pub fn has_no_collision(article: &Article) -> bool {
    article.collisions() == 0
}

/// Deformed without any recorded collision: the damage came from packaging.
pub fn is_quality_problem(article: &Article) -> bool {
    is_deformed(article) && has_no_collision(article)
}

pub fn is_critical_article(article: &Article) -> bool {
    article.collisions() > 0
}

/// Counted towards the "zone with the most problems" tally.
pub fn is_problem_article(article: &Article) -> bool {
    is_deformed(article) || is_critical_article(article)
}

// ---------------------------------------------------------------------------
// Operations and personnel
// ---------------------------------------------------------------------------

pub fn has_negative_margin(operation: &CommercialOperation) -> bool {
    operation.margin() < 0.0
}

pub fn is_in_progress(operation: &CommercialOperation) -> bool {
    operation.etat.as_deref() == Some(OPERATION_IN_PROGRESS)
}

pub fn is_on_sick_leave(person: &Personnel) -> bool {
    person.state() == STATE_SICK_LEAVE
}

// ---------------------------------------------------------------------------
// Sanitary
// ---------------------------------------------------------------------------

/// Temperature and humidity both inside the comfort band (bounds included).
pub fn is_optimal(reading: &SanitaryReading) -> bool {
    let (t_lo, t_hi) = OPTIMAL_TEMPERATURE;
    let (h_lo, h_hi) = OPTIMAL_HUMIDITY;
    let t = reading.temperature();
    let h = reading.humidity();
    (t_lo..=t_hi).contains(&t) && (h_lo..=h_hi).contains(&h)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumidityProblem {
    TooDry,
    TooHumid,
}

impl HumidityProblem {
    pub fn classify(mean: f64) -> Option<Self> {
        if mean < HUMIDITY_DRY_BELOW {
            Some(Self::TooDry)
        } else if mean > HUMIDITY_WET_ABOVE {
            Some(Self::TooHumid)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::TooDry => "Trop sec",
            Self::TooHumid => "Trop humide",
        }
    }
}

/// Mean of `metric` per zone, zones ascending. Missing values count as 0.
pub fn zone_means(readings: &[SanitaryReading], metric: impl Fn(&SanitaryReading) -> f64) -> BTreeMap<i64, f64> {
    group_average(readings, SanitaryReading::zone_id, |r| Some(metric(r)))
        .into_iter()
        .collect()
}

/// Zones whose mean strictly exceeds `limit`, zones ascending.
pub fn zones_above(means: &BTreeMap<i64, f64>, limit: f64) -> Vec<(i64, f64)> {
    means
        .iter()
        .filter(|(_, mean)| **mean > limit)
        .map(|(zone, mean)| (*zone, *mean))
        .collect()
}

/// Zones whose mean humidity is outside the comfort band.
pub fn humidity_problems(means: &BTreeMap<i64, f64>) -> Vec<(i64, f64, HumidityProblem)> {
    means
        .iter()
        .filter_map(|(zone, mean)| HumidityProblem::classify(*mean).map(|p| (*zone, *mean, p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn surveillance(value: serde_json::Value) -> SurveillanceRecord {
        serde_json::from_value(value).expect("surveillance fixture")
    }

    fn reading(zone: i64, temperature: f64, humidite: f64) -> SanitaryReading {
        SanitaryReading {
            zone: Some(zone),
            temperature: Some(temperature),
            humidite: Some(humidite),
            ..Default::default()
        }
    }

    #[test]
    fn test_urgent_zone_is_union_of_rules() {
        let fire = surveillance(json!({"zone": 1, "detection_incendie": "oui", "drones_panne": 1}));
        let failure = surveillance(json!({"zone": 2, "detection_incendie": "non", "drones_panne": 2}));
        let audit = surveillance(json!({"zone": 3, "audit_conformite": "non"}));
        let calm = surveillance(json!({"zone": 4, "audit_conformite": "oui", "drones_panne": 1}));

        assert!(is_urgent(&fire) && is_fire(&fire) && !is_critical_drone_failure(&fire));
        assert!(is_urgent(&failure) && is_critical_drone_failure(&failure));
        assert!(is_urgent(&audit) && is_non_compliant(&audit));
        assert!(!is_urgent(&calm));
        assert!(has_drone_failure(&calm));
        assert!(is_compliant(&calm));
    }

    #[test]
    fn test_suspect_shape_ignores_none_markers() {
        assert!(!has_suspect_shape(&surveillance(json!({}))));
        assert!(!has_suspect_shape(&surveillance(json!({"detection_forme": ""}))));
        assert!(!has_suspect_shape(&surveillance(json!({"detection_forme": "aucune"}))));
        assert!(has_suspect_shape(&surveillance(json!({"detection_forme": "humain"}))));
    }

    #[test]
    fn test_quality_problem_requires_zero_collisions() {
        let deformed: Article =
            serde_json::from_value(json!({"etat_emballage": "Déformé", "collisions": 0})).expect("article");
        let bumped: Article =
            serde_json::from_value(json!({"etat_emballage": "Déformé", "collisions": 2})).expect("article");
        let untracked: Article =
            serde_json::from_value(json!({"etat_emballage": "Déformé"})).expect("article");
        assert!(is_quality_problem(&deformed));
        assert!(!is_quality_problem(&bumped));
        assert!(is_quality_problem(&untracked));
        assert!(is_problem_article(&bumped));
    }

    #[test]
    fn test_optimal_bounds_are_inclusive() {
        assert!(is_optimal(&reading(1, 21.0, 45.0)));
        assert!(is_optimal(&reading(1, 24.0, 55.0)));
        assert!(!is_optimal(&reading(1, 24.1, 50.0)));
        assert!(!is_optimal(&reading(1, 22.0, 56.0)));
    }

    #[test]
    fn test_zone_rules_use_zone_average() {
        let readings = vec![reading(5, 27.0, 35.0), reading(5, 25.0, 38.0), reading(2, 30.0, 65.0), reading(2, 18.0, 61.0)];
        let temps = zone_means(&readings, SanitaryReading::temperature);
        // zone 2 averages exactly 24.0 and must not be flagged
        assert_eq!(zones_above(&temps, TEMPERATURE_LIMIT), vec![(5, 26.0)]);

        let humidity = zone_means(&readings, SanitaryReading::humidity);
        let problems = humidity_problems(&humidity);
        assert_eq!(problems, vec![(2, 63.0, HumidityProblem::TooHumid), (5, 36.5, HumidityProblem::TooDry)]);
        assert_eq!(problems[1].2.label(), "Trop sec");
    }

    #[test]
    fn test_negative_margin_and_sick_leave() {
        let op: CommercialOperation = serde_json::from_value(json!({"marge": -5})).expect("operation");
        assert!(has_negative_margin(&op));
        assert!(!is_in_progress(&op));
        let person: Personnel = serde_json::from_value(json!({"etat": "arret_maladie"})).expect("person");
        assert!(is_on_sick_leave(&person));
    }
}
