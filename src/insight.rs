use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::{DOMINANCE_SHARE, IQR_FENCE, SKEW_EPSILON, SKEW_THRESHOLD};
use crate::filter::FilteredView;
use crate::loader;
use crate::models::{
    CategoryCount, CategoryDominance, CorrelationMatrix, CorrelationPair, Direction,
    FeedbackSample, GroupMean, LinearTrend, NumericColumn, NumericSummary, Outlier,
    OutlierReport, Overview, ProvinceCount, Record, Sentiment, TextColumn,
};

const POSITIVE_MARKERS: &[&str] = &["baik", "bagus", "membantu", "positif", "recommend"];
const SENTIMENT_COLUMN: &str = "Sentiment";

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut ordered = values.to_vec();
    ordered.sort_by(f64::total_cmp);
    ordered
}

/// Quantile of ascending `sorted` data, interpolating linearly between ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let center = mean(values)?;
    let squares: f64 = values.iter().map(|value| (value - center).powi(2)).sum();
    Some((squares / (values.len() - 1) as f64).sqrt())
}

/// Mean-vs-median divergence heuristic; not a statistical test.
pub fn is_skewed(mean: f64, median: f64) -> bool {
    (mean - median).abs() / (median.abs() + SKEW_EPSILON) > SKEW_THRESHOLD
}

pub fn describe(view: &FilteredView<'_>, column: NumericColumn) -> Option<NumericSummary> {
    if !view.has(column) {
        return None;
    }

    let ordered = sorted(&view.numbers(column));
    let mean = mean(&ordered)?;
    let median = quantile(&ordered, 0.5)?;

    Some(NumericSummary {
        column,
        count: ordered.len(),
        missing: view.len() - ordered.len(),
        mean,
        std_dev: sample_std(&ordered),
        min: *ordered.first()?,
        q1: quantile(&ordered, 0.25)?,
        median,
        q3: quantile(&ordered, 0.75)?,
        max: *ordered.last()?,
        skewed: is_skewed(mean, median),
    })
}

pub fn describe_all(view: &FilteredView<'_>) -> Vec<NumericSummary> {
    view.dataset()
        .numeric_columns()
        .into_iter()
        .filter_map(|column| describe(view, column))
        .collect()
}

fn count_values<'v>(values: impl Iterator<Item = &'v str>) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut tallies: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(value, count)| CategoryCount {
            value: value.to_string(),
            count,
        })
        .collect();

    tallies.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.value.cmp(&b.value))
    });
    tallies
}

/// Frequencies of non-null values, most frequent first; ties sort by value.
pub fn value_counts(view: &FilteredView<'_>, column: TextColumn) -> Vec<CategoryCount> {
    count_values(view.texts(column))
}

pub fn top_n(view: &FilteredView<'_>, column: TextColumn, n: usize) -> Vec<CategoryCount> {
    value_counts(view, column).into_iter().take(n).collect()
}

pub fn dominance(view: &FilteredView<'_>, column: TextColumn) -> Option<CategoryDominance> {
    let counts = value_counts(view, column);
    let total: usize = counts.iter().map(|entry| entry.count).sum();
    let top = counts.into_iter().next()?;
    let share = top.count as f64 / total as f64;

    Some(CategoryDominance {
        column,
        top,
        share,
        dominant: share > DOMINANCE_SHARE,
    })
}

/// Non-null `target` values keyed by non-null `group` value.
pub fn grouped_values(
    view: &FilteredView<'_>,
    group: TextColumn,
    target: NumericColumn,
) -> BTreeMap<String, Vec<f64>> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in view.records() {
        if let (Some(key), Some(value)) = (group.value(record), target.value(record)) {
            groups.entry(key.to_string()).or_default().push(value);
        }
    }
    groups
}

pub fn grouped_mean(
    view: &FilteredView<'_>,
    group: TextColumn,
    target: NumericColumn,
) -> Vec<GroupMean> {
    grouped_values(view, group, target)
        .into_iter()
        .filter_map(|(group, values)| {
            Some(GroupMean {
                mean: mean(&values)?,
                count: values.len(),
                group,
            })
        })
        .collect()
}

fn complete_pairs(view: &FilteredView<'_>, x: NumericColumn, y: NumericColumn) -> Vec<(f64, f64)> {
    view.records()
        .iter()
        .filter_map(|record| Some((x.value(record)?, y.value(record)?)))
        .collect()
}

pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Pearson r for every pair of present columns over pairwise-complete rows.
pub fn correlation_matrix(view: &FilteredView<'_>, columns: &[NumericColumn]) -> CorrelationMatrix {
    let mut present: Vec<NumericColumn> = Vec::new();
    for column in columns {
        if view.has(*column) && !present.contains(column) {
            present.push(*column);
        }
    }

    let values = present
        .iter()
        .map(|a| {
            present
                .iter()
                .map(|b| {
                    let r = pearson(&complete_pairs(view, *a, *b));
                    if a == b {
                        r.map(|_| 1.0)
                    } else {
                        r
                    }
                })
                .collect()
        })
        .collect();

    CorrelationMatrix {
        columns: present,
        values,
    }
}

/// Each unordered pair with |r| at or above `threshold`, reported once.
pub fn strong_correlations(matrix: &CorrelationMatrix, threshold: f64) -> Vec<CorrelationPair> {
    let mut pairs = Vec::new();
    for (i, a) in matrix.columns.iter().enumerate() {
        for (j, b) in matrix.columns.iter().enumerate().skip(i + 1) {
            let Some(r) = matrix.values[i][j] else {
                continue;
            };
            if r.abs() >= threshold {
                pairs.push(CorrelationPair {
                    a: *a,
                    b: *b,
                    r,
                    direction: if r > 0.0 {
                        Direction::Positive
                    } else {
                        Direction::Negative
                    },
                });
            }
        }
    }
    pairs
}

/// IQR fences computed from the view itself, never from the full dataset.
pub fn outliers(view: &FilteredView<'_>, column: NumericColumn) -> Option<OutlierReport> {
    if !view.has(column) {
        return None;
    }

    let ordered = sorted(&view.numbers(column));
    let q1 = quantile(&ordered, 0.25)?;
    let q3 = quantile(&ordered, 0.75)?;
    let iqr = q3 - q1;
    let lower = q1 - IQR_FENCE * iqr;
    let upper = q3 + IQR_FENCE * iqr;

    let outliers = view
        .records()
        .iter()
        .enumerate()
        .filter_map(|(position, record)| {
            let value = column.value(record)?;
            (value < lower || value > upper).then_some(Outlier { position, value })
        })
        .collect();

    Some(OutlierReport {
        column,
        q1,
        q3,
        iqr,
        lower,
        upper,
        outliers,
    })
}

fn column_mean(view: &FilteredView<'_>, column: NumericColumn) -> Option<f64> {
    if view.has(column) {
        mean(&view.numbers(column))
    } else {
        None
    }
}

pub fn overview(view: &FilteredView<'_>, full: &FilteredView<'_>) -> Overview {
    let mean_salary = column_mean(view, NumericColumn::Salary);
    let salary_delta_pct = match (mean_salary, column_mean(full, NumericColumn::Salary)) {
        (Some(filtered), Some(overall)) if overall != 0.0 => {
            Some((filtered / overall - 1.0) * 100.0)
        }
        _ => None,
    };

    Overview {
        respondents: view.len(),
        mean_salary,
        mean_gpa: column_mean(view, NumericColumn::Gpa),
        mean_job_search_months: column_mean(view, NumericColumn::JobSearchMonths),
        salary_delta_pct,
        top_industry: value_counts(view, TextColumn::IndustrySector).into_iter().next(),
        top_province: value_counts(view, TextColumn::Location).into_iter().next(),
    }
}

/// Ordinary least squares fit of `y` on `x` over rows carrying both values.
pub fn linear_trend(
    view: &FilteredView<'_>,
    x: NumericColumn,
    y: NumericColumn,
) -> Option<LinearTrend> {
    let pairs = complete_pairs(view, x, y);
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(px, _)| px).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, py)| py).sum::<f64>() / n;
    let sxx: f64 = pairs.iter().map(|(px, _)| (px - mean_x).powi(2)).sum();
    let sxy: f64 = pairs
        .iter()
        .map(|(px, py)| (px - mean_x) * (py - mean_y))
        .sum();

    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;

    Some(LinearTrend {
        x,
        y,
        slope,
        intercept: mean_y - slope * mean_x,
        r: pearson(&pairs),
        observations: pairs.len(),
    })
}

pub fn province_distribution(view: &FilteredView<'_>) -> Vec<ProvinceCount> {
    value_counts(view, TextColumn::Location)
        .into_iter()
        .map(|entry| ProvinceCount {
            mapped: loader::is_canonical_province(&entry.value),
            province: entry.value,
            count: entry.count,
        })
        .collect()
}

pub fn classify_sentiment(text: &str) -> Sentiment {
    let lowered = text.to_lowercase();
    if POSITIVE_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}

fn has_sentiment_column(view: &FilteredView<'_>) -> bool {
    view.dataset()
        .extra_columns
        .iter()
        .any(|name| name == SENTIMENT_COLUMN)
}

/// A labelled `Sentiment` column in the source wins over keyword rules.
fn sentiment_label<'r>(labelled: bool, record: &'r Record) -> Option<&'r str> {
    if labelled {
        record.extra.get(SENTIMENT_COLUMN).map(|label| label.trim())
    } else {
        Some(classify_sentiment(record.feedback.as_deref().unwrap_or("")).label())
    }
}

pub fn sentiment_distribution(view: &FilteredView<'_>) -> Vec<CategoryCount> {
    let labelled = has_sentiment_column(view);
    count_values(
        view.records()
            .iter()
            .filter_map(|record| sentiment_label(labelled, record)),
    )
}

pub fn feedback_sample(view: &FilteredView<'_>, n: usize, seed: u64) -> Vec<FeedbackSample> {
    let labelled = has_sentiment_column(view);
    let candidates: Vec<FeedbackSample> = view
        .records()
        .iter()
        .enumerate()
        .filter_map(|(position, record)| {
            Some(FeedbackSample {
                position,
                text: record.feedback.clone()?,
                sentiment: sentiment_label(labelled, record)?.to_string(),
            })
        })
        .collect();

    let mut rng = StdRng::seed_from_u64(seed);
    candidates
        .choose_multiple(&mut rng, n)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::STRONG_CORRELATION;
    use crate::models::{Column, Dataset};

    fn dataset(records: Vec<Record>, columns: &[Column]) -> Dataset {
        Dataset {
            records,
            columns: columns.to_vec(),
            extra_columns: Vec::new(),
        }
    }

    fn salaries(values: &[f64]) -> Dataset {
        dataset(
            values
                .iter()
                .map(|salary| Record {
                    salary: Some(*salary),
                    ..Record::default()
                })
                .collect(),
            &[Column::Numeric(NumericColumn::Salary)],
        )
    }

    #[test]
    fn skew_flag_follows_mean_median_divergence() {
        assert!(is_skewed(100.0, 50.0));
        assert!(!is_skewed(100.0, 98.0));
        assert!(is_skewed(5.0, 0.0));
    }

    #[test]
    fn describe_flags_skewed_columns() {
        let skewed = salaries(&[50.0, 50.0, 50.0, 250.0]);
        let summary =
            describe(&FilteredView::all(&skewed), NumericColumn::Salary).expect("summary");
        assert_eq!(summary.mean, 100.0);
        assert_eq!(summary.median, 50.0);
        assert!(summary.skewed);

        let symmetric = salaries(&[98.0, 98.0, 98.0, 106.0]);
        let summary =
            describe(&FilteredView::all(&symmetric), NumericColumn::Salary).expect("summary");
        assert_eq!(summary.mean, 100.0);
        assert_eq!(summary.median, 98.0);
        assert!(!summary.skewed);
        assert_eq!(summary.min, 98.0);
        assert_eq!(summary.max, 106.0);
    }

    #[test]
    fn describe_skips_absent_columns_and_counts_missing() {
        let mut data = salaries(&[10.0, 20.0]);
        data.records.push(Record::default());
        let view = FilteredView::all(&data);

        assert!(describe(&view, NumericColumn::Gpa).is_none());
        let summary = describe(&view, NumericColumn::Salary).expect("summary");
        assert_eq!(summary.count, 2);
        assert_eq!(summary.missing, 1);
        assert_eq!(describe_all(&view).len(), 1);
    }

    #[test]
    fn iqr_rule_flags_single_outlier() {
        let data = salaries(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
        let report = outliers(&FilteredView::all(&data), NumericColumn::Salary).expect("report");

        assert!((report.q1 - 2.25).abs() < 1e-12);
        assert!((report.q3 - 4.75).abs() < 1e-12);
        assert!((report.iqr - 2.5).abs() < 1e-12);
        assert!((report.upper - 8.5).abs() < 1e-12);
        assert_eq!(report.outliers.len(), 1);
        assert_eq!(report.outliers[0].value, 100.0);
        assert_eq!(report.outliers[0].position, 5);
    }

    fn text_records(column: TextColumn, values: &[&str]) -> Dataset {
        dataset(
            values
                .iter()
                .map(|value| {
                    let mut record = Record::default();
                    *column.field_mut(&mut record) = Some(value.to_string());
                    record
                })
                .collect(),
            &[Column::Text(column)],
        )
    }

    #[test]
    fn value_counts_break_ties_by_value() {
        let data = text_records(
            TextColumn::Company,
            &["Beta", "Alpha", "Beta", "Alpha", "Gamma"],
        );
        let counts = value_counts(&FilteredView::all(&data), TextColumn::Company);

        let order: Vec<_> = counts.iter().map(|entry| entry.value.as_str()).collect();
        assert_eq!(order, vec!["Alpha", "Beta", "Gamma"]);
        assert_eq!(
            top_n(&FilteredView::all(&data), TextColumn::Company, 2).len(),
            2
        );
    }

    #[test]
    fn dominance_needs_more_than_sixty_percent() {
        let dominant = text_records(
            TextColumn::IndustrySector,
            &["Energi", "Energi", "Energi", "Energi", "Telekomunikasi"],
        );
        let result = dominance(&FilteredView::all(&dominant), TextColumn::IndustrySector)
            .expect("dominance");
        assert_eq!(result.top.value, "Energi");
        assert!((result.share - 0.8).abs() < 1e-12);
        assert!(result.dominant);

        let balanced = text_records(
            TextColumn::IndustrySector,
            &["Energi", "Energi", "Energi", "Manufaktur", "Telekomunikasi"],
        );
        let result = dominance(&FilteredView::all(&balanced), TextColumn::IndustrySector)
            .expect("dominance");
        assert!(!result.dominant);
    }

    fn correlated() -> Dataset {
        let rows = [
            (2018, 1000.0, 2.0, 5.0),
            (2020, 2000.0, 2.5, 4.0),
            (2019, 3000.0, 3.0, 3.0),
            (2020, 4000.0, 3.5, 2.0),
            (2018, 5000.0, 4.0, 1.0),
        ];
        dataset(
            rows.iter()
                .map(|(year, salary, gpa, wait)| Record {
                    cohort_year: Some(*year),
                    salary: Some(*salary),
                    gpa: Some(*gpa),
                    job_search_months: Some(*wait),
                    ..Record::default()
                })
                .collect(),
            &[
                Column::Numeric(NumericColumn::CohortYear),
                Column::Numeric(NumericColumn::Salary),
                Column::Numeric(NumericColumn::Gpa),
                Column::Numeric(NumericColumn::JobSearchMonths),
            ],
        )
    }

    #[test]
    fn strong_threshold_is_inclusive() {
        let matrix = CorrelationMatrix {
            columns: vec![
                NumericColumn::Salary,
                NumericColumn::Gpa,
                NumericColumn::JobSearchMonths,
            ],
            values: vec![
                vec![Some(1.0), Some(0.5), Some(-0.4999)],
                vec![Some(0.5), Some(1.0), Some(-0.5)],
                vec![Some(-0.4999), Some(-0.5), Some(1.0)],
            ],
        };

        let pairs = strong_correlations(&matrix, STRONG_CORRELATION);
        let found: Vec<(NumericColumn, NumericColumn, Direction)> = pairs
            .iter()
            .map(|pair| (pair.a, pair.b, pair.direction))
            .collect();
        assert_eq!(
            found,
            vec![
                (
                    NumericColumn::Salary,
                    NumericColumn::Gpa,
                    Direction::Positive
                ),
                (
                    NumericColumn::Gpa,
                    NumericColumn::JobSearchMonths,
                    Direction::Negative
                ),
            ]
        );
    }

    #[test]
    fn strong_pairs_are_reported_once_with_direction() {
        let data = correlated();
        let view = FilteredView::all(&data);
        let matrix = correlation_matrix(&view, &NumericColumn::ALL);

        assert_eq!(matrix.columns.len(), 4);
        assert_eq!(
            matrix.get(NumericColumn::Salary, NumericColumn::Salary),
            Some(1.0)
        );
        assert_eq!(
            matrix.get(NumericColumn::Salary, NumericColumn::CohortYear),
            Some(0.0)
        );

        let pairs = strong_correlations(&matrix, 0.5);
        assert_eq!(pairs.len(), 3);
        for pair in &pairs {
            assert!(!pairs.iter().any(|other| other.a == pair.b && other.b == pair.a));
            assert_ne!(pair.a, NumericColumn::CohortYear);
            assert_ne!(pair.b, NumericColumn::CohortYear);
        }

        let salary_gpa = pairs
            .iter()
            .find(|pair| pair.a == NumericColumn::Salary && pair.b == NumericColumn::Gpa)
            .expect("salary/gpa");
        assert_eq!(salary_gpa.direction, Direction::Positive);

        let gpa_wait = pairs
            .iter()
            .find(|pair| pair.a == NumericColumn::Gpa && pair.b == NumericColumn::JobSearchMonths)
            .expect("gpa/wait");
        assert_eq!(gpa_wait.direction, Direction::Negative);
        assert!((gpa_wait.r + 1.0).abs() < 1e-9);
    }

    #[test]
    fn pearson_is_undefined_without_variance() {
        assert_eq!(pearson(&[(1.0, 2.0)]), None);
        assert_eq!(pearson(&[(1.0, 2.0), (1.0, 3.0)]), None);
    }

    #[test]
    fn linear_trend_fits_exact_line() {
        let data = correlated();
        let trend = linear_trend(
            &FilteredView::all(&data),
            NumericColumn::Gpa,
            NumericColumn::JobSearchMonths,
        )
        .expect("trend");

        assert!((trend.slope + 2.0).abs() < 1e-9);
        assert!((trend.intercept - 9.0).abs() < 1e-9);
        assert_eq!(trend.observations, 5);
    }

    #[test]
    fn grouped_mean_sorts_groups_and_skips_missing_targets() {
        let mut data = text_records(
            TextColumn::Location,
            &["Jawa Barat", "Banten", "Jawa Barat", "Bali"],
        );
        data.columns.push(Column::Numeric(NumericColumn::Salary));
        data.records[0].salary = Some(4.0);
        data.records[1].salary = Some(6.0);
        data.records[2].salary = Some(8.0);

        let means = grouped_mean(
            &FilteredView::all(&data),
            TextColumn::Location,
            NumericColumn::Salary,
        );
        let groups: Vec<_> = means.iter().map(|entry| (entry.group.as_str(), entry.mean)).collect();
        assert_eq!(groups, vec![("Banten", 6.0), ("Jawa Barat", 6.0)]);
    }

    #[test]
    fn overview_compares_filtered_salary_with_everyone() {
        let data = salaries(&[100.0, 200.0, 300.0, 400.0]);
        let full = FilteredView::all(&data);
        let mut filters = crate::filter::FilterState::default();
        filters.init_defaults(&data);
        let view = crate::filter::apply(&data, &filters);

        let summary = overview(&view, &full);
        assert_eq!(summary.respondents, 4);
        assert_eq!(summary.mean_salary, Some(250.0));
        assert_eq!(summary.salary_delta_pct, Some(0.0));
        assert!(summary.mean_gpa.is_none());
        assert!(summary.top_province.is_none());
    }

    #[test]
    fn province_distribution_marks_unmapped_names() {
        let data = text_records(
            TextColumn::Location,
            &["DKI Jakarta", "Luar Negeri", "DKI Jakarta"],
        );
        let provinces = province_distribution(&FilteredView::all(&data));

        assert_eq!(provinces[0].province, "DKI Jakarta");
        assert_eq!(provinces[0].count, 2);
        assert!(provinces[0].mapped);
        assert!(!provinces[1].mapped);
    }

    #[test]
    fn keyword_sentiment_rules() {
        assert_eq!(
            classify_sentiment("Kurikulum sangat MEMBANTU"),
            Sentiment::Positive
        );
        assert_eq!(
            classify_sentiment("Highly recommended"),
            Sentiment::Positive
        );
        assert_eq!(
            classify_sentiment("Perlu update materi"),
            Sentiment::Neutral
        );
        assert_eq!(classify_sentiment(""), Sentiment::Neutral);
    }

    #[test]
    fn sentiment_counts_every_row_and_samples_deterministically() {
        let mut data = text_records(
            TextColumn::Feedback,
            &["Dosen baik", "Perbanyak praktikum", "Bagus", "Tingkatkan lab"],
        );
        data.records.push(Record::default());
        let view = FilteredView::all(&data);

        let counts = sentiment_distribution(&view);
        assert_eq!(
            counts,
            vec![
                CategoryCount {
                    value: "Neutral".to_string(),
                    count: 3
                },
                CategoryCount {
                    value: "Positive".to_string(),
                    count: 2
                },
            ]
        );

        let first = feedback_sample(&view, 3, 42);
        let second = feedback_sample(&view, 3, 42);
        assert_eq!(first.len(), 3);
        let positions: Vec<_> = first.iter().map(|sample| sample.position).collect();
        assert_eq!(
            positions,
            second
                .iter()
                .map(|sample| sample.position)
                .collect::<Vec<_>>()
        );
        assert!(positions.iter().all(|position| *position < 4));
        assert_eq!(feedback_sample(&view, 10, 42).len(), 4);
    }

    #[test]
    fn labelled_sentiment_column_takes_precedence() {
        let mut data = text_records(TextColumn::Feedback, &["Bagus sekali", "Biasa"]);
        data.extra_columns.push(SENTIMENT_COLUMN.to_string());
        data.records[0]
            .extra
            .insert(SENTIMENT_COLUMN.to_string(), "Negative".to_string());

        let counts = sentiment_distribution(&FilteredView::all(&data));
        assert_eq!(
            counts,
            vec![CategoryCount { value: "Negative".to_string(), count: 1 }]
        );
    }
}
