use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::dashboard::ZoneCo2;
use super::{run_page, Page, PageResult};
use crate::aggregate::{average, count_where, group_average, min_by, min_max};
use crate::alerts::{
    humidity_problems, is_optimal, zone_means, zones_above, CO2_LIMIT, PM2_5_LIMIT,
    TEMPERATURE_LIMIT,
};
use crate::data_api::{fetch, DataSource};
use crate::ranking::{bottom, top};
use crate::records::SanitaryReading;
use crate::util::{round_to, zone_label};

/// Concentration assumed for a reading without one when looking for the
/// cleanest zone.
const MISSING_CONCENTRATION_RANK: f64 = 999.0;
const TOP_ZONES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneTemperature {
    pub zone: String,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneHumidity {
    pub zone: String,
    pub humidite: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZonePressure {
    pub zone: String,
    pub pression: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityByZone {
    pub zones: Vec<String>,
    pub pm10: Vec<f64>,
    pub pm25: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spread {
    pub min: f64,
    pub max: f64,
    pub moy: f64,
}

impl Spread {
    /// Spread of the non-zero readings, one decimal.
    fn of(values: &[f64]) -> Self {
        let (min, max) = min_max(values).unwrap_or((0.0, 0.0));
        Self {
            min: round_to(min, 1),
            max: round_to(max, 1),
            moy: round_to(average(values), 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComfortComparison {
    pub temperature: Spread,
    pub humidite: Spread,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureAlert {
    pub zone: i64,
    pub temperature: f64,
}

/// Zone-level CO2 mean, used by the alert list and both rankings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneCo2Mean {
    pub zone: i64,
    pub co2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleAlert {
    pub zone: i64,
    pub pm2_5: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HumidityAlert {
    pub zone: i64,
    pub humidite: f64,
    pub probleme: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitaryOverview {
    pub total_zones: usize,
    pub temp_moyenne: f64,
    pub zone_meilleur_co2: Option<SanitaryReading>,
    pub zone_meilleur_air: Option<SanitaryReading>,
    pub humidite_moyenne: f64,
    pub zones_optimales: usize,
    pub graphique_temperature: Vec<ZoneTemperature>,
    pub graphique_co2: Vec<ZoneCo2>,
    pub graphique_humidite: Vec<ZoneHumidity>,
    pub graphique_qualite_air: AirQualityByZone,
    pub graphique_pression: Vec<ZonePressure>,
    pub graphique_comparatif: ComfortComparison,
    pub zones_temp_elevee: Vec<TemperatureAlert>,
    pub zones_co2_eleve: Vec<ZoneCo2Mean>,
    pub zones_particules_elevees: Vec<ParticleAlert>,
    pub zones_humidite_probleme: Vec<HumidityAlert>,
    pub top_co2: Vec<ZoneCo2Mean>,
    pub pire_co2: Vec<ZoneCo2Mean>,
}

/// Present and non-zero values of one metric.
fn recorded(readings: &[SanitaryReading], metric: impl Fn(&SanitaryReading) -> Option<f64>) -> Vec<f64> {
    readings
        .iter()
        .filter_map(metric)
        .filter(|v| *v != 0.0)
        .collect()
}

/// Zone chart rows from sorted zone means.
fn chart<R>(means: &BTreeMap<i64, f64>, decimals: u32, row: impl Fn(String, f64) -> R) -> Vec<R> {
    means
        .iter()
        .map(|(zone, mean)| row(zone_label(*zone), round_to(*mean, decimals)))
        .collect()
}

pub fn compute_sanitary(readings: &[SanitaryReading]) -> SanitaryOverview {
    let temperatures = recorded(readings, |r| r.temperature);
    let humidities = recorded(readings, |r| r.humidite);

    let temperature_means = zone_means(readings, SanitaryReading::temperature);
    let co2_means = zone_means(readings, SanitaryReading::co2);
    let humidity_means = zone_means(readings, SanitaryReading::humidity);
    let pm10_means = zone_means(readings, SanitaryReading::pm10);
    let pm2_5_means = zone_means(readings, SanitaryReading::pm2_5);
    let pressure_means = zone_means(readings, SanitaryReading::pressure);

    // Rankings run over zones in first-seen order so ties keep input order.
    let co2_ranking: Vec<ZoneCo2Mean> =
        group_average(readings, SanitaryReading::zone_id, |r| Some(r.co2()))
            .into_iter()
            .map(|(zone, mean)| ZoneCo2Mean {
                zone,
                co2: round_to(mean, 3),
            })
            .collect();

    let distinct_zones: BTreeSet<i64> = readings.iter().map(SanitaryReading::zone_id).collect();

    SanitaryOverview {
        total_zones: distinct_zones.len(),
        temp_moyenne: round_to(average(&temperatures), 1),
        zone_meilleur_co2: min_by(readings, |r| r.co2.unwrap_or(MISSING_CONCENTRATION_RANK)).cloned(),
        zone_meilleur_air: min_by(readings, |r| r.pm2_5.unwrap_or(MISSING_CONCENTRATION_RANK)).cloned(),
        humidite_moyenne: round_to(average(&humidities), 1),
        zones_optimales: count_where(readings, is_optimal),
        graphique_temperature: chart(&temperature_means, 1, |zone, temperature| ZoneTemperature {
            zone,
            temperature,
        }),
        graphique_co2: chart(&co2_means, 3, |zone, co2| ZoneCo2 { zone, co2 }),
        graphique_humidite: chart(&humidity_means, 1, |zone, humidite| ZoneHumidity { zone, humidite }),
        graphique_qualite_air: AirQualityByZone {
            zones: pm10_means.keys().copied().map(zone_label).collect(),
            pm10: pm10_means.values().map(|m| round_to(*m, 3)).collect(),
            pm25: pm2_5_means.values().map(|m| round_to(*m, 3)).collect(),
        },
        graphique_pression: chart(&pressure_means, 2, |zone, pression| ZonePressure { zone, pression }),
        graphique_comparatif: ComfortComparison {
            temperature: Spread::of(&temperatures),
            humidite: Spread::of(&humidities),
        },
        zones_temp_elevee: zones_above(&temperature_means, TEMPERATURE_LIMIT)
            .into_iter()
            .map(|(zone, mean)| TemperatureAlert {
                zone,
                temperature: round_to(mean, 1),
            })
            .collect(),
        zones_co2_eleve: zones_above(&co2_means, CO2_LIMIT)
            .into_iter()
            .map(|(zone, mean)| ZoneCo2Mean {
                zone,
                co2: round_to(mean, 3),
            })
            .collect(),
        zones_particules_elevees: zones_above(&pm2_5_means, PM2_5_LIMIT)
            .into_iter()
            .map(|(zone, mean)| ParticleAlert {
                zone,
                pm2_5: round_to(mean, 3),
            })
            .collect(),
        zones_humidite_probleme: humidity_problems(&humidity_means)
            .into_iter()
            .map(|(zone, mean, problem)| HumidityAlert {
                zone,
                humidite: round_to(mean, 1),
                probleme: problem.label(),
            })
            .collect(),
        top_co2: bottom(&co2_ranking, |row| row.co2, TOP_ZONES),
        pire_co2: top(&co2_ranking, |row| row.co2, TOP_ZONES),
    }
}

pub fn sanitary_overview(source: &dyn DataSource) -> PageResult<SanitaryOverview> {
    run_page(Page::Sanitaire, || {
        let readings: Vec<SanitaryReading> = fetch(source)?;
        Ok(compute_sanitary(&readings))
    })
}
