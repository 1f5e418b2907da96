//! Pick the formation with the best engagement.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::PartnerSource;
use crate::aggregate::max_by;
use crate::records::lenient;

/// A training programme as served by the formations service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub nom_formation: Option<String>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub pourcentage_engagement: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub pourcentage_satisfaction: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Formation {
    /// Shown whenever the service cannot name a best formation.
    pub fn unavailable() -> Self {
        Self {
            nom_formation: Some("Service indisponible".to_string()),
            pourcentage_engagement: Some(0.0),
            pourcentage_satisfaction: Some(0.0),
            extra: Map::new(),
        }
    }

    pub fn engagement(&self) -> f64 {
        self.pourcentage_engagement.unwrap_or(0.0)
    }
}

/// Highest engagement, first one listed on ties.
pub fn best_formation(formations: &[Formation]) -> Option<&Formation> {
    max_by(formations, Formation::engagement)
}

/// Best formation from the service, or [`Formation::unavailable`] on any
/// failure, non-success answer or empty list.
pub fn resolve_best_formation(partners: &dyn PartnerSource) -> Formation {
    let fallback = Formation::unavailable();
    match partners.formations() {
        Ok(formations) => match best_formation(&formations) {
            Some(best) => {
                log::info!(
                    "Best formation: {}",
                    best.nom_formation.as_deref().unwrap_or("(unnamed)")
                );
                best.clone()
            }
            None => {
                log::warn!("Formations service returned no formation, using fallback");
                fallback
            }
        },
        Err(e) => {
            log::warn!("Formations service unavailable, using fallback: {}", e);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::FixturePartners;
    use serde_json::json;

    fn formations(value: Value) -> Vec<Formation> {
        serde_json::from_value(value).expect("formations fixture")
    }

    #[test]
    fn test_best_formation_first_on_ties() {
        let list = formations(json!([
            {"nom_formation": "Sécurité", "pourcentage_engagement": 72},
            {"nom_formation": "Drones", "pourcentage_engagement": 91},
            {"nom_formation": "Qualité", "pourcentage_engagement": 91},
            {"nom_formation": "Sans score"}
        ]));
        let best = best_formation(&list).expect("best");
        assert_eq!(best.nom_formation.as_deref(), Some("Drones"));
    }

    #[test]
    fn test_unavailable_shape() {
        let value = serde_json::to_value(Formation::unavailable()).expect("encode");
        assert_eq!(
            value,
            json!({
                "nom_formation": "Service indisponible",
                "pourcentage_engagement": 0.0,
                "pourcentage_satisfaction": 0.0
            })
        );
    }

    #[test]
    fn test_extra_fields_are_echoed() {
        let list = formations(json!([{"nom_formation": "RGPD", "pourcentage_engagement": 50, "duree": "2j"}]));
        let value = serde_json::to_value(&list[0]).expect("encode");
        assert_eq!(value["duree"], "2j");
        assert_eq!(value["pourcentage_engagement"], 50.0);
    }

    #[test]
    fn test_empty_list_uses_fallback() {
        let partners = FixturePartners::default().with_formations(json!([]));
        assert_eq!(resolve_best_formation(&partners), Formation::unavailable());
    }

    #[test]
    fn test_error_status_uses_fallback() {
        let partners = FixturePartners::default()
            .with_formations(json!([{"nom_formation": "Drones", "pourcentage_engagement": 91}]))
            .formations_status(503);
        assert_eq!(resolve_best_formation(&partners), Formation::unavailable());
    }

    #[test]
    fn test_unreachable_service_uses_fallback() {
        assert_eq!(resolve_best_formation(&FixturePartners::default()), Formation::unavailable());
    }
}
