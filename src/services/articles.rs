use std::collections::BTreeMap;

use serde::Serialize;

use super::{run_page, Labeled, Page, PageResult};
use crate::aggregate::{count_where, group_count, max_by, min_by, percentage, ratio, sum_int_by};
use crate::alerts::{
    has_no_collision, is_critical_article, is_deformed, is_packaging_ok, is_problem_article,
    is_quality_problem,
};
use crate::data_api::{fetch, DataSource};
use crate::enrich::{PersonnelIndex, WithManagerName};
use crate::ranking::top;
use crate::records::{Article, Personnel, PACKAGING_DEFORMED, PACKAGING_OK, UNKNOWN_LABEL};
use crate::util::{round_to, zone_label};

/// Collision count assumed for an article without one when looking for the
/// least damaged article.
const MISSING_COLLISIONS_RANK: f64 = 999.0;
const TOP_MANAGERS: usize = 10;
const TOP_CRITICAL: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneCollisions {
    pub zone: String,
    pub collisions: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackagingByZone {
    pub zones: Vec<String>,
    pub correct: Vec<usize>,
    pub deforme: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollisionBucket {
    pub collisions: i64,
    pub nombre_articles: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerArticleCount {
    pub responsable: String,
    pub total: usize,
    pub nom: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticlesOverview {
    pub article_moins_collisions: Option<Article>,
    pub total_articles: usize,
    pub articles_conformes: usize,
    pub articles_deformes: usize,
    pub total_collisions: i64,
    pub taux_conformite: f64,
    pub articles_sans_collision: usize,
    pub collision_moyenne: f64,
    pub graphique_emballages: Vec<Labeled<usize>>,
    pub graphique_zones: Vec<Labeled<usize>>,
    pub graphique_collisions_zones: Vec<ZoneCollisions>,
    pub emballage_par_zone: PackagingByZone,
    pub graphique_distribution_collisions: Vec<CollisionBucket>,
    pub top_responsables: Vec<ManagerArticleCount>,
    pub articles_critiques: Vec<WithManagerName<Article>>,
    pub articles_qualite_probleme: Vec<Article>,
    /// `[zone, count]` of the zone with the most problem articles.
    pub zone_plus_problemes: Option<(i64, usize)>,
}

fn packaging_by_zone(articles: &[Article]) -> PackagingByZone {
    let mut per_zone: BTreeMap<i64, (usize, usize)> = BTreeMap::new();
    for article in articles {
        let entry = per_zone.entry(article.zone_id()).or_insert((0, 0));
        if is_packaging_ok(article) {
            entry.0 += 1;
        } else if is_deformed(article) {
            entry.1 += 1;
        }
    }
    PackagingByZone {
        zones: per_zone.keys().copied().map(zone_label).collect(),
        correct: per_zone.values().map(|(ok, _)| *ok).collect(),
        deforme: per_zone.values().map(|(_, deformed)| *deformed).collect(),
    }
}

fn zone_with_most_problems(articles: &[Article]) -> Option<(i64, usize)> {
    let problems: Vec<&Article> = articles.iter().filter(|a| is_problem_article(a)).collect();
    let per_zone: Vec<(i64, usize)> = group_count(&problems, |a| Some(a.zone_id()), 0)
        .into_iter()
        .collect();
    max_by(&per_zone, |(_, count)| *count as f64).copied()
}

fn top_managers(articles: &[Article], index: &PersonnelIndex<'_>) -> Vec<ManagerArticleCount> {
    let rows: Vec<ManagerArticleCount> = group_count(articles, |a| Some(a.manager_key()), UNKNOWN_LABEL)
        .into_iter()
        .map(|(ssn, total)| ManagerArticleCount {
            responsable: ssn.to_string(),
            total,
            nom: index.resolve_name(ssn),
        })
        .collect();
    top(&rows, |row| row.total as f64, TOP_MANAGERS)
}

pub fn compute_articles(articles: &[Article], personnel: &[Personnel]) -> ArticlesOverview {
    let index = PersonnelIndex::build(personnel);

    let total_articles = articles.len();
    let articles_conformes = count_where(articles, is_packaging_ok);
    let articles_deformes = count_where(articles, is_deformed);
    let total_collisions = sum_int_by(articles, Article::collisions);

    let mut per_zone: BTreeMap<i64, (usize, i64)> = BTreeMap::new();
    let mut distribution: BTreeMap<i64, usize> = BTreeMap::new();
    for article in articles {
        let zone = per_zone.entry(article.zone_id()).or_insert((0, 0));
        zone.0 += 1;
        zone.1 += article.collisions();
        *distribution.entry(article.collisions()).or_insert(0) += 1;
    }

    let critical: Vec<&Article> = articles.iter().filter(|a| is_critical_article(a)).collect();
    let articles_critiques = top(&critical, |a| a.collisions() as f64, TOP_CRITICAL)
        .into_iter()
        .map(|a| WithManagerName::new(a, a.manager_key(), &index))
        .collect();

    ArticlesOverview {
        article_moins_collisions: min_by(articles, |a| {
            a.collisions.map_or(MISSING_COLLISIONS_RANK, |c| c as f64)
        })
        .cloned(),
        total_articles,
        articles_conformes,
        articles_deformes,
        total_collisions,
        taux_conformite: round_to(percentage(articles_conformes as f64, total_articles as f64), 1),
        articles_sans_collision: count_where(articles, has_no_collision),
        collision_moyenne: round_to(ratio(total_collisions as f64, total_articles as f64), 2),
        graphique_emballages: vec![
            Labeled::new("etat", PACKAGING_OK, articles_conformes),
            Labeled::new("etat", PACKAGING_DEFORMED, articles_deformes),
        ],
        graphique_zones: per_zone
            .iter()
            .map(|(zone, (total, _))| Labeled::new("zone", zone_label(*zone), *total))
            .collect(),
        graphique_collisions_zones: per_zone
            .iter()
            .map(|(zone, (_, collisions))| ZoneCollisions {
                zone: zone_label(*zone),
                collisions: *collisions,
            })
            .collect(),
        emballage_par_zone: packaging_by_zone(articles),
        graphique_distribution_collisions: distribution
            .into_iter()
            .map(|(collisions, nombre_articles)| CollisionBucket {
                collisions,
                nombre_articles,
            })
            .collect(),
        top_responsables: top_managers(articles, &index),
        articles_critiques,
        articles_qualite_probleme: articles.iter().filter(|a| is_quality_problem(a)).cloned().collect(),
        zone_plus_problemes: zone_with_most_problems(articles),
    }
}

pub fn articles_overview(source: &dyn DataSource) -> PageResult<ArticlesOverview> {
    run_page(Page::Articles, || {
        let articles: Vec<Article> = fetch(source)?;
        let personnel: Vec<Personnel> = fetch(source)?;
        Ok(compute_articles(&articles, &personnel))
    })
}
