//! Typed views over the raw records served by the data-access service.
//!
//! Every field is optional on the wire. A value of the wrong JSON type is read
//! as absent instead of failing the whole collection, and each accessor states
//! the default that applies when the field is absent. Fields this module does
//! not know about are kept in `extra` so a record echoed into a payload is
//! emitted unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Grouping label for records with no value for the grouping key.
pub const UNKNOWN_LABEL: &str = "Inconnu";
/// `detection_forme` value meaning nothing was detected.
pub const NO_SHAPE: &str = "aucune";
/// Role assumed for personnel without one.
pub const DEFAULT_ROLE: &str = "employe";

pub const ROLE_MANAGER: &str = "responsable";
pub const STATE_ACTIVE: &str = "actif";
pub const STATE_SICK_LEAVE: &str = "arret_maladie";
pub const STATE_LEAVE: &str = "conge";
pub const PACKAGING_OK: &str = "Correct";
pub const PACKAGING_DEFORMED: &str = "Déformé";
pub const OPERATION_PURCHASE: &str = "achat";
pub const OPERATION_SALE: &str = "vente";
pub const OPERATION_IN_PROGRESS: &str = "en cours";
pub const YES: &str = "oui";
pub const NO: &str = "non";

pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub(crate) fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(Value::deserialize(d)?.as_f64())
    }

    pub(crate) fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| {
                        if f >= i64::MAX as f64 || f < i64::MIN as f64 {
                            log::warn!("Integer field {} out of range; clamped", n);
                        }
                        f as i64
                    })
            }),
            _ => None,
        })
    }

    pub(crate) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}

/// A member of staff.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Personnel {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub ssn: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub nom_prenom: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub etat: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub pays: Option<String>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub freq_cardiaque: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing)]
    pub password: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Personnel {
    pub fn service_label(&self) -> &str {
        self.service.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn country_label(&self) -> &str {
        self.pays.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or(DEFAULT_ROLE)
    }

    pub fn state(&self) -> &str {
        self.etat.as_deref().unwrap_or("")
    }

    pub fn is_manager(&self) -> bool {
        self.role() == ROLE_MANAGER
    }

    /// Heart rate, only when a positive reading was recorded.
    pub fn heart_rate(&self) -> Option<f64> {
        self.freq_cardiaque.filter(|bpm| *bpm > 0.0)
    }
}

/// One surveillance snapshot of a zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveillanceRecord {
    #[serde(default, deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub zone: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub detection_incendie: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub drones_actifs: Option<i64>,
    #[serde(default, deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub drones_panne: Option<i64>,
    #[serde(default, deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub drones_rechargement: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub audit_conformite: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub detection_forme: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SurveillanceRecord {
    pub fn zone_id(&self) -> i64 {
        self.zone.unwrap_or(0)
    }

    pub fn fire_detected(&self) -> bool {
        self.detection_incendie.as_deref() == Some(YES)
    }

    pub fn active_drones(&self) -> i64 {
        self.drones_actifs.unwrap_or(0)
    }

    pub fn failed_drones(&self) -> i64 {
        self.drones_panne.unwrap_or(0)
    }

    pub fn charging_drones(&self) -> i64 {
        self.drones_rechargement.unwrap_or(0)
    }

    pub fn total_drones(&self) -> i64 {
        crate::aggregate::saturating_total([
            self.active_drones(),
            self.failed_drones(),
            self.charging_drones(),
        ])
    }

    pub fn audit(&self) -> &str {
        self.audit_conformite.as_deref().unwrap_or("")
    }

    pub fn shape(&self) -> &str {
        self.detection_forme.as_deref().unwrap_or(NO_SHAPE)
    }
}

/// A physical article tracked through the site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub zone: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub etat_emballage: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub collisions: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub responsable: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Article {
    pub fn zone_id(&self) -> i64 {
        self.zone.unwrap_or(0)
    }

    pub fn packaging(&self) -> &str {
        self.etat_emballage.as_deref().unwrap_or("")
    }

    pub fn packaging_label(&self) -> &str {
        self.etat_emballage.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn collisions(&self) -> i64 {
        self.collisions.unwrap_or(0)
    }

    /// Personnel ssn of the person in charge, `"Inconnu"` when unassigned.
    pub fn manager_key(&self) -> &str {
        self.responsable.as_deref().unwrap_or(UNKNOWN_LABEL)
    }
}

/// One sanitary reading taken in a zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SanitaryReading {
    #[serde(default, deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub zone: Option<i64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub humidite: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub co2: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub pm10: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub pm2_5: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub pression: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SanitaryReading {
    pub fn zone_id(&self) -> i64 {
        self.zone.unwrap_or(0)
    }

    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or(0.0)
    }

    pub fn humidity(&self) -> f64 {
        self.humidite.unwrap_or(0.0)
    }

    pub fn co2(&self) -> f64 {
        self.co2.unwrap_or(0.0)
    }

    pub fn pm10(&self) -> f64 {
        self.pm10.unwrap_or(0.0)
    }

    pub fn pm2_5(&self) -> f64 {
        self.pm2_5.unwrap_or(0.0)
    }

    pub fn pressure(&self) -> f64 {
        self.pression.unwrap_or(0.0)
    }
}

/// A purchase or sale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommercialOperation {
    /// Kept raw: some exports use numeric ids, others strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(rename = "type", default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub marge: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub km: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub responsable: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub etat: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub mot_cle_responsable: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub mot_cle_client: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CommercialOperation {
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or("")
    }

    pub fn is_purchase(&self) -> bool {
        self.kind() == OPERATION_PURCHASE
    }

    pub fn is_sale(&self) -> bool {
        self.kind() == OPERATION_SALE
    }

    pub fn margin(&self) -> f64 {
        self.marge.unwrap_or(0.0)
    }

    pub fn distance(&self) -> f64 {
        self.km.unwrap_or(0.0)
    }

    pub fn manager_key(&self) -> &str {
        self.responsable.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn state_label(&self) -> &str {
        self.etat.as_deref().unwrap_or("inconnu")
    }

    pub fn manager_keyword(&self) -> &str {
        self.mot_cle_responsable.as_deref().unwrap_or("")
    }

    pub fn client_keyword(&self) -> &str {
        self.mot_cle_client.as_deref().unwrap_or("")
    }

    /// Ordering key for the margin timeline; non-integer ids sort as 0.
    pub fn sequence(&self) -> i64 {
        self.id.as_ref().and_then(Value::as_i64).unwrap_or(0)
    }

    /// Display id, if the record carries a usable one.
    pub fn display_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Identity record returned by the login lookup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoginRecord {
    #[serde(default, deserialize_with = "lenient::text")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub ssn: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub nom_prenom: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub etat: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub service: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub role: Option<String>,
}

impl LoginRecord {
    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or(DEFAULT_ROLE)
    }

    /// Everything but the stored password.
    pub fn identity(&self) -> Identity {
        Identity {
            ssn: self.ssn.clone(),
            nom_prenom: self.nom_prenom.clone(),
            etat: self.etat.clone(),
            service: self.service.clone(),
            role: self.role().to_string(),
        }
    }
}

/// Printable identity of a login.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub ssn: Option<String>,
    pub nom_prenom: Option<String>,
    pub etat: Option<String>,
    pub service: Option<String>,
    pub role: String,
}
