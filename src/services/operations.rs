use indexmap::IndexMap;
use serde::Serialize;

use super::{run_page, Labeled, Page, PageResult};
use crate::aggregate::{count_where, group_count, group_sum, max_by, percentage, ratio, sum_by};
use crate::alerts::has_negative_margin;
use crate::data_api::{fetch, DataSource};
use crate::enrich::{PersonnelIndex, WithManagerName};
use crate::ranking::top;
use crate::records::{CommercialOperation, Personnel, UNKNOWN_LABEL};
use crate::util::round_to;

const TOP_MANAGERS: usize = 10;
const TOP_KEYWORDS: usize = 10;
const TOP_OPERATIONS: usize = 5;
const TIMELINE_LENGTH: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeMargin {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub marge: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerMargin {
    pub responsable: String,
    pub marge: f64,
    pub nom: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerDistance {
    pub responsable: String,
    pub km: f64,
    pub nom: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerOperationCount {
    pub responsable: String,
    pub total: usize,
    pub nom: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginPoint {
    pub operation: String,
    pub marge: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordCount {
    pub mot: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationsOverview {
    pub total_operations: usize,
    pub marge_totale: f64,
    pub distance_totale: f64,
    pub meilleure_operation: Option<WithManagerName<CommercialOperation>>,
    pub marge_moyenne: f64,
    pub distance_moyenne: f64,
    pub ratio_achats_ventes: f64,
    pub ratio_marges: f64,
    pub nb_achats: usize,
    pub nb_ventes: usize,
    pub graphique_types: Vec<Labeled<usize>>,
    pub graphique_marges: Vec<TypeMargin>,
    pub top_responsables: Vec<ManagerMargin>,
    pub top_distances: Vec<ManagerDistance>,
    pub graphique_evolution: Vec<MarginPoint>,
    pub top_ops_responsables: Vec<ManagerOperationCount>,
    pub responsable_plus_actif: Option<ManagerOperationCount>,
    pub operations_marges_negatives: Vec<WithManagerName<CommercialOperation>>,
    pub top_operations: Vec<WithManagerName<CommercialOperation>>,
    pub top_mots_responsable: Vec<KeywordCount>,
    pub top_mots_client: Vec<KeywordCount>,
    pub operations_par_etat: IndexMap<String, usize>,
}

fn with_name(operation: &CommercialOperation, index: &PersonnelIndex<'_>) -> WithManagerName<CommercialOperation> {
    WithManagerName::new(operation, operation.manager_key(), index)
}

/// The most recent operations by id, oldest first.
fn margin_timeline(operations: &[CommercialOperation]) -> Vec<MarginPoint> {
    let mut recent = top(operations, |op| op.sequence() as f64, TIMELINE_LENGTH);
    recent.reverse();
    recent
        .iter()
        .enumerate()
        .map(|(position, op)| MarginPoint {
            operation: format!(
                "Op {}",
                op.display_id().unwrap_or_else(|| (position + 1).to_string())
            ),
            marge: op.margin(),
        })
        .collect()
}

fn top_keywords<'a>(
    operations: &'a [CommercialOperation],
    keyword: impl Fn(&'a CommercialOperation) -> &'a str,
) -> Vec<KeywordCount> {
    let used: Vec<&str> = operations
        .iter()
        .map(keyword)
        .filter(|word| !word.is_empty())
        .collect();
    let rows: Vec<KeywordCount> = group_count(&used, |word| Some(*word), "")
        .into_iter()
        .map(|(mot, count)| KeywordCount {
            mot: mot.to_string(),
            count,
        })
        .collect();
    top(&rows, |row| row.count as f64, TOP_KEYWORDS)
}

pub fn compute_operations(operations: &[CommercialOperation], personnel: &[Personnel]) -> OperationsOverview {
    let index = PersonnelIndex::build(personnel);
    let total_operations = operations.len();

    let marge_totale = sum_by(operations, CommercialOperation::margin);
    let distance_totale = sum_by(operations, CommercialOperation::distance);

    let nb_achats = count_where(operations, CommercialOperation::is_purchase);
    let nb_ventes = count_where(operations, CommercialOperation::is_sale);
    let marge_achats: f64 = operations.iter().filter(|op| op.is_purchase()).map(CommercialOperation::margin).sum();
    let marge_ventes: f64 = operations.iter().filter(|op| op.is_sale()).map(CommercialOperation::margin).sum();

    let margins = group_sum(operations, CommercialOperation::manager_key, CommercialOperation::margin);
    let margin_rows: Vec<ManagerMargin> = margins
        .into_iter()
        .map(|(ssn, marge)| ManagerMargin {
            responsable: ssn.to_string(),
            marge,
            nom: index.resolve_name(ssn),
        })
        .collect();

    let distances = group_sum(operations, CommercialOperation::manager_key, CommercialOperation::distance);
    let distance_rows: Vec<ManagerDistance> = distances
        .into_iter()
        .map(|(ssn, km)| ManagerDistance {
            responsable: ssn.to_string(),
            km,
            nom: index.resolve_name(ssn),
        })
        .collect();

    let counts = group_count(operations, |op| Some(op.manager_key()), UNKNOWN_LABEL);
    let count_rows: Vec<ManagerOperationCount> = counts
        .into_iter()
        .map(|(ssn, total)| ManagerOperationCount {
            responsable: ssn.to_string(),
            total,
            nom: index.resolve_name(ssn),
        })
        .collect();
    let top_ops_responsables = top(&count_rows, |row| row.total as f64, TOP_MANAGERS);

    let operations_par_etat = group_count(operations, |op| Some(op.state_label()), "inconnu")
        .into_iter()
        .map(|(state, count)| (state.to_string(), count))
        .collect();

    OperationsOverview {
        total_operations,
        marge_totale: round_to(marge_totale, 2),
        distance_totale: round_to(distance_totale, 2),
        meilleure_operation: max_by(operations, CommercialOperation::margin).map(|op| with_name(op, &index)),
        marge_moyenne: round_to(ratio(marge_totale, total_operations as f64), 2),
        // Exact ties round away from zero: a mean of 11.125 km shows as 11.13.
        distance_moyenne: round_to(ratio(distance_totale, total_operations as f64), 2),
        ratio_achats_ventes: round_to(percentage(nb_achats as f64, nb_ventes as f64), 1),
        ratio_marges: round_to(percentage(marge_achats, marge_ventes), 1),
        nb_achats,
        nb_ventes,
        graphique_types: vec![
            Labeled::new("type", "Achats", nb_achats),
            Labeled::new("type", "Ventes", nb_ventes),
        ],
        graphique_marges: vec![
            TypeMargin {
                kind: "Achats",
                marge: marge_achats,
            },
            TypeMargin {
                kind: "Ventes",
                marge: marge_ventes,
            },
        ],
        top_responsables: top(&margin_rows, |row| row.marge, TOP_MANAGERS),
        top_distances: top(&distance_rows, |row| row.km, TOP_MANAGERS),
        graphique_evolution: margin_timeline(operations),
        responsable_plus_actif: top_ops_responsables.first().cloned(),
        top_ops_responsables,
        operations_marges_negatives: operations
            .iter()
            .filter(|op| has_negative_margin(op))
            .map(|op| with_name(op, &index))
            .collect(),
        top_operations: top(operations, CommercialOperation::margin, TOP_OPERATIONS)
            .iter()
            .map(|op| with_name(op, &index))
            .collect(),
        top_mots_responsable: top_keywords(operations, CommercialOperation::manager_keyword),
        top_mots_client: top_keywords(operations, CommercialOperation::client_keyword),
        operations_par_etat,
    }
}

pub fn operations_overview(source: &dyn DataSource) -> PageResult<OperationsOverview> {
    run_page(Page::Operations, || {
        let operations: Vec<CommercialOperation> = fetch(source)?;
        let personnel: Vec<Personnel> = fetch(source)?;
        Ok(compute_operations(&operations, &personnel))
    })
}
