use std::collections::BTreeSet;

use serde::Serialize;

use super::{count_rows, run_page, Labeled, Page, PageResult};
use crate::aggregate::{average, count_where, group_average, group_count};
use crate::alerts::is_on_sick_leave;
use crate::data_api::{fetch, DataSource};
use crate::records::{Personnel, STATE_ACTIVE, STATE_LEAVE, UNKNOWN_LABEL};
use crate::util::round_to;

/// Managers vs staff per service, services sorted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RolesByService {
    pub services: Vec<String>,
    pub responsables: Vec<usize>,
    pub employes: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceHeartRate {
    pub service: String,
    pub moyenne: f64,
}

/// Staff member on sick leave. Fields are echoed as stored, null if absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SickLeaveEntry {
    pub nom: Option<String>,
    pub service: Option<String>,
    pub ssn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonnelOverview {
    pub total_employes: usize,
    pub employes_actifs: usize,
    pub freq_cardiaque_moyenne: f64,
    pub nb_responsables: usize,
    pub graphique_services: Vec<Labeled<usize>>,
    pub graphique_pays: Vec<Labeled<usize>>,
    pub graphique_etats: Vec<Labeled<usize>>,
    pub graphique_roles: RolesByService,
    pub graphique_freq_cardiaque: Vec<ServiceHeartRate>,
    pub liste_maladie: Vec<SickLeaveEntry>,
}

fn roles_by_service(personnel: &[Personnel]) -> RolesByService {
    let tally = group_count(
        personnel,
        |p| Some((p.service_label(), p.is_manager())),
        (UNKNOWN_LABEL, false),
    );
    let services: BTreeSet<&str> = tally.keys().map(|(service, _)| *service).collect();
    let per_service = |manager: bool| -> Vec<usize> {
        services
            .iter()
            .map(|service| tally.get(&(*service, manager)).copied().unwrap_or(0))
            .collect()
    };

    RolesByService {
        responsables: per_service(true),
        employes: per_service(false),
        services: services.into_iter().map(str::to_string).collect(),
    }
}

pub fn compute_personnel(personnel: &[Personnel]) -> PersonnelOverview {
    let employes_actifs = count_where(personnel, |p| p.state() == STATE_ACTIVE);
    let employes_maladie = count_where(personnel, is_on_sick_leave);
    let employes_conge = count_where(personnel, |p| p.state() == STATE_LEAVE);

    let heart_rates: Vec<f64> = personnel.iter().filter_map(Personnel::heart_rate).collect();

    let graphique_freq_cardiaque = group_average(personnel, Personnel::service_label, Personnel::heart_rate)
        .into_iter()
        .map(|(service, mean)| ServiceHeartRate {
            service: service.to_string(),
            moyenne: round_to(mean, 1),
        })
        .collect();

    let liste_maladie = personnel
        .iter()
        .filter(|p| is_on_sick_leave(p))
        .map(|p| SickLeaveEntry {
            nom: p.nom_prenom.clone(),
            service: p.service.clone(),
            ssn: p.ssn.clone(),
        })
        .collect();

    PersonnelOverview {
        total_employes: personnel.len(),
        employes_actifs,
        freq_cardiaque_moyenne: round_to(average(&heart_rates), 1),
        nb_responsables: count_where(personnel, Personnel::is_manager),
        graphique_services: count_rows(
            "service",
            group_count(personnel, |p| p.service.as_deref(), UNKNOWN_LABEL),
        ),
        graphique_pays: count_rows(
            "pays",
            group_count(personnel, |p| p.pays.as_deref(), UNKNOWN_LABEL),
        ),
        graphique_etats: vec![
            Labeled::new("etat", "Actif", employes_actifs),
            Labeled::new("etat", "Arrêt maladie", employes_maladie),
            Labeled::new("etat", "Congé", employes_conge),
        ],
        graphique_roles: roles_by_service(personnel),
        graphique_freq_cardiaque,
        liste_maladie,
    }
}

pub fn personnel_overview(source: &dyn DataSource) -> PageResult<PersonnelOverview> {
    run_page(Page::Personnel, || {
        let personnel: Vec<Personnel> = fetch(source)?;
        Ok(compute_personnel(&personnel))
    })
}
