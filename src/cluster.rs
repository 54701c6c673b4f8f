use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::{KMEANS_MAX_ITERATIONS, KMEANS_RESTARTS, KMEANS_TOLERANCE};
use crate::error::InsightError;
use crate::filter::FilteredView;
use crate::models::{
    AttributeMean, ClusterAssignment, ClusterOutcome, ClusterSummary, Extreme, NumericColumn,
    Superlative,
};

/// Partitions the rows of `view` that carry every attribute into `k` clusters.
///
/// Attributes are standardized on each call. Labels are reproducible for a
/// given `seed`.
pub fn cluster(
    view: &FilteredView<'_>,
    attributes: &[NumericColumn],
    k: usize,
    seed: u64,
) -> Result<ClusterOutcome, InsightError> {
    let mut selected: Vec<NumericColumn> = Vec::new();
    for attribute in attributes {
        if !selected.contains(attribute) {
            selected.push(*attribute);
        }
    }

    if selected.is_empty() {
        return Err(InsightError::InvalidSelection(
            "choose at least one attribute to cluster on".to_string(),
        ));
    }
    if let Some(missing) = selected.iter().find(|attribute| !view.has(**attribute)) {
        return Err(InsightError::MissingColumn(missing.header().to_string()));
    }
    if k == 0 {
        return Err(InsightError::InvalidSelection(
            "cluster count must be positive".to_string(),
        ));
    }

    let (positions, raw): (Vec<usize>, Vec<Vec<f64>>) = view
        .records()
        .iter()
        .enumerate()
        .filter_map(|(position, record)| {
            let row: Option<Vec<f64>> =
                selected.iter().map(|column| column.value(record)).collect();
            row.map(|row| (position, row))
        })
        .unzip();

    if raw.len() < k {
        return Err(InsightError::InsufficientData(format!(
            "{} complete rows for {k} clusters",
            raw.len()
        )));
    }

    let points = standardize(&raw);
    let mut rng = StdRng::seed_from_u64(seed);
    let (labels, inertia) = kmeans(&points, k, &mut rng);
    debug!(k, rows = points.len(), inertia, "k-means finished");

    let assignments = positions
        .iter()
        .zip(&labels)
        .map(|(position, label)| ClusterAssignment {
            position: *position,
            label: *label,
        })
        .collect();

    Ok(ClusterOutcome {
        k,
        clusters: summarize(&selected, &raw, &labels, k),
        attributes: selected,
        assignments,
        inertia,
    })
}

/// Zero mean and unit population variance per column; constant columns are
/// only centered.
pub fn standardize(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let Some(width) = rows.first().map(Vec::len) else {
        return Vec::new();
    };
    let n = rows.len() as f64;

    let scales: Vec<(f64, f64)> = (0..width)
        .map(|j| {
            let mean = rows.iter().map(|row| row[j]).sum::<f64>() / n;
            let variance = rows.iter().map(|row| (row[j] - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            (mean, if std > 0.0 { std } else { 1.0 })
        })
        .collect();

    rows.iter()
        .map(|row| {
            row.iter()
                .zip(&scales)
                .map(|(value, (mean, std))| (value - mean) / std)
                .collect()
        })
        .collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (label, centroid) in centroids.iter().enumerate() {
        let distance = squared_distance(point, centroid);
        if distance < best.1 {
            best = (label, distance);
        }
    }
    best
}

/// k-means++ seeding: each further centroid is drawn with probability
/// proportional to its squared distance from the centroids chosen so far.
fn seed_centroids(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centroids = vec![points[rng.gen_range(0..points.len())].clone()];

    while centroids.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|point| nearest(point, &centroids).1)
            .collect();
        let total: f64 = weights.iter().sum();

        let chosen = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = points.len() - 1;
            for (index, weight) in weights.iter().enumerate() {
                if target < *weight {
                    chosen = index;
                    break;
                }
                target -= weight;
            }
            chosen
        } else {
            rng.gen_range(0..points.len())
        };

        centroids.push(points[chosen].clone());
    }

    centroids
}

/// Lloyd iterations from several seedings; the run with the lowest inertia wins.
fn kmeans(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> (Vec<usize>, f64) {
    let width = points[0].len();
    let mut best: Option<(Vec<usize>, f64)> = None;

    for _ in 0..KMEANS_RESTARTS {
        let mut centroids = seed_centroids(points, k, rng);
        let mut labels = vec![0usize; points.len()];

        for _ in 0..KMEANS_MAX_ITERATIONS {
            for (label, point) in labels.iter_mut().zip(points) {
                *label = nearest(point, &centroids).0;
            }

            let mut sums = vec![vec![0.0; width]; k];
            let mut counts = vec![0usize; k];
            for (label, point) in labels.iter().zip(points) {
                counts[*label] += 1;
                for (sum, value) in sums[*label].iter_mut().zip(point) {
                    *sum += value;
                }
            }

            let mut shift = 0.0;
            for (cluster, centroid) in centroids.iter_mut().enumerate() {
                // An emptied cluster keeps its previous centroid.
                if counts[cluster] == 0 {
                    continue;
                }
                let updated: Vec<f64> = sums[cluster]
                    .iter()
                    .map(|sum| sum / counts[cluster] as f64)
                    .collect();
                shift += squared_distance(centroid, &updated);
                *centroid = updated;
            }

            if shift <= KMEANS_TOLERANCE {
                break;
            }
        }

        let mut inertia = 0.0;
        for (label, point) in labels.iter_mut().zip(points) {
            let (nearest_label, distance) = nearest(point, &centroids);
            *label = nearest_label;
            inertia += distance;
        }

        if best.as_ref().map_or(true, |(_, lowest)| inertia < *lowest) {
            best = Some((labels, inertia));
        }
    }

    best.unwrap_or_else(|| (vec![0; points.len()], 0.0))
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn summarize(
    attributes: &[NumericColumn],
    raw: &[Vec<f64>],
    labels: &[usize],
    k: usize,
) -> Vec<ClusterSummary> {
    let mut clusters: Vec<ClusterSummary> = (0..k)
        .map(|label| {
            let members: Vec<&Vec<f64>> = raw
                .iter()
                .zip(labels)
                .filter(|(_, assigned)| **assigned == label)
                .map(|(row, _)| row)
                .collect();

            let means = if members.is_empty() {
                Vec::new()
            } else {
                attributes
                    .iter()
                    .enumerate()
                    .map(|(j, column)| {
                        let mean =
                            members.iter().map(|row| row[j]).sum::<f64>() / members.len() as f64;
                        AttributeMean {
                            column: *column,
                            mean: round_to(mean, column.display_decimals()),
                        }
                    })
                    .collect()
            };

            ClusterSummary {
                label,
                size: members.len(),
                means,
                flags: Vec::new(),
            }
        })
        .collect();

    // Ties are all flagged.
    for (j, column) in attributes.iter().enumerate() {
        let displayed: Vec<f64> = clusters
            .iter()
            .filter_map(|cluster| cluster.means.get(j).map(|entry| entry.mean))
            .collect();
        let Some(highest) = displayed.iter().copied().reduce(f64::max) else {
            continue;
        };
        let lowest = displayed.iter().copied().fold(highest, f64::min);

        for cluster in clusters.iter_mut() {
            let Some(entry) = cluster.means.get(j) else {
                continue;
            };
            if entry.mean == highest {
                cluster.flags.push(Superlative {
                    column: *column,
                    extreme: Extreme::Highest,
                });
            }
            if entry.mean == lowest {
                cluster.flags.push(Superlative {
                    column: *column,
                    extreme: Extreme::Lowest,
                });
            }
        }
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, Dataset, Record};

    fn blobs() -> Dataset {
        let centers = [(3_000_000.0, 2.8), (6_000_000.0, 3.4), (12_000_000.0, 3.9)];
        let mut records = Vec::new();
        for (salary, gpa) in centers {
            for offset in 0..4 {
                records.push(Record {
                    salary: Some(salary + offset as f64 * 50_000.0),
                    gpa: Some(gpa + offset as f64 * 0.01),
                    job_search_months: Some(6.0 - gpa),
                    ..Record::default()
                });
            }
        }
        records.push(Record {
            salary: Some(4_000_000.0),
            gpa: None,
            ..Record::default()
        });

        Dataset {
            records,
            columns: vec![
                Column::Numeric(NumericColumn::Salary),
                Column::Numeric(NumericColumn::Gpa),
                Column::Numeric(NumericColumn::JobSearchMonths),
            ],
            extra_columns: Vec::new(),
        }
    }

    #[test]
    fn every_complete_row_gets_one_label_below_k() {
        let data = blobs();
        let view = FilteredView::all(&data);
        let outcome = cluster(&view, &[NumericColumn::Salary, NumericColumn::Gpa], 3, 42)
            .expect("clusters");

        assert_eq!(outcome.assignments.len(), 12);
        assert!(outcome.assignments.iter().all(|entry| entry.label < 3));
        assert!(!outcome.assignments.iter().any(|entry| entry.position == 12));

        for blob in outcome.assignments.chunks(4) {
            assert!(blob.iter().all(|entry| entry.label == blob[0].label));
        }
        let mut distinct: Vec<usize> =
            outcome.assignments.iter().map(|entry| entry.label).collect();
        distinct.sort_unstable();
        distinct.dedup();
        assert_eq!(distinct, vec![0, 1, 2]);
    }

    #[test]
    fn same_seed_same_labels() {
        let data = blobs();
        let view = FilteredView::all(&data);
        let attributes = [
            NumericColumn::Salary,
            NumericColumn::Gpa,
            NumericColumn::JobSearchMonths,
        ];

        let first = cluster(&view, &attributes, 3, 42).expect("first");
        let second = cluster(&view, &attributes, 3, 42).expect("second");
        let labels = |outcome: &ClusterOutcome| {
            outcome
                .assignments
                .iter()
                .map(|entry| entry.label)
                .collect::<Vec<_>>()
        };
        assert_eq!(labels(&first), labels(&second));
    }

    #[test]
    fn summaries_flag_extremes() {
        let data = blobs();
        let view = FilteredView::all(&data);
        let outcome = cluster(
            &view,
            &[NumericColumn::Salary, NumericColumn::Gpa, NumericColumn::JobSearchMonths],
            3,
            42,
        )
        .expect("clusters");

        let richest = outcome
            .clusters
            .iter()
            .find(|cluster| {
                cluster.flags.contains(&Superlative {
                    column: NumericColumn::Salary,
                    extreme: Extreme::Highest,
                })
            })
            .expect("richest cluster");
        assert_eq!(richest.size, 4);
        assert_eq!(richest.means[0].mean, 12_075_000.0);
        assert!(richest.flags.contains(&Superlative {
            column: NumericColumn::JobSearchMonths,
            extreme: Extreme::Lowest,
        }));
        assert_eq!(
            Superlative {
                column: NumericColumn::JobSearchMonths,
                extreme: Extreme::Lowest,
            }
            .describe(),
            "fastest job placement"
        );
    }

    #[test]
    fn tied_extremes_are_all_flagged() {
        let attributes = [NumericColumn::Gpa];
        let raw = vec![vec![3.0], vec![3.0], vec![2.0]];
        let clusters = summarize(&attributes, &raw, &[0, 1, 2], 3);

        let highest: Vec<usize> = clusters
            .iter()
            .filter(|cluster| cluster.flags.iter().any(|flag| flag.extreme == Extreme::Highest))
            .map(|cluster| cluster.label)
            .collect();
        assert_eq!(highest, vec![0, 1]);
    }

    #[test]
    fn too_few_complete_rows_is_insufficient_data() {
        let data = blobs();
        let view = FilteredView::all(&data);
        let err = cluster(&view, &[NumericColumn::Salary, NumericColumn::Gpa], 13, 42)
            .expect_err("k too large");
        assert!(matches!(err, InsightError::InsufficientData(_)));
    }

    #[test]
    fn attribute_selection_is_validated() {
        let data = blobs();
        let view = FilteredView::all(&data);

        assert!(matches!(
            cluster(&view, &[], 2, 42),
            Err(InsightError::InvalidSelection(_))
        ));
        assert!(matches!(
            cluster(&view, &[NumericColumn::CohortYear], 2, 42),
            Err(InsightError::MissingColumn(_))
        ));
    }

    #[test]
    fn standardize_centers_and_scales() {
        let scaled = standardize(&[vec![1.0, 5.0], vec![3.0, 5.0]]);
        assert_eq!(scaled, vec![vec![-1.0, 0.0], vec![1.0, 0.0]]);
    }
}
