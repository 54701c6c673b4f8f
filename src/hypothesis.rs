use std::collections::BTreeMap;

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor};

use crate::config::SIGNIFICANCE_LEVEL;
use crate::error::InsightError;
use crate::filter::FilteredView;
use crate::insight;
use crate::models::{AnovaResult, ChiSquareResult, ContingencyTable, NumericColumn, TextColumn};

/// Cross-tabulation of two categorical columns over rows carrying both values.
/// Row and column labels are sorted.
pub fn contingency_table(
    view: &FilteredView<'_>,
    row_column: TextColumn,
    col_column: TextColumn,
) -> ContingencyTable {
    let mut cells: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    let mut rows: Vec<String> = Vec::new();
    let mut columns: Vec<String> = Vec::new();

    for record in view.records() {
        let (Some(row), Some(col)) = (row_column.value(record), col_column.value(record)) else {
            continue;
        };
        *cells.entry((row, col)).or_insert(0) += 1;
        if !rows.iter().any(|existing| existing == row) {
            rows.push(row.to_string());
        }
        if !columns.iter().any(|existing| existing == col) {
            columns.push(col.to_string());
        }
    }

    rows.sort();
    columns.sort();

    let counts = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| {
                    cells
                        .get(&(row.as_str(), col.as_str()))
                        .copied()
                        .unwrap_or(0)
                })
                .collect()
        })
        .collect();

    ContingencyTable {
        row_column,
        col_column,
        rows,
        columns,
        counts,
    }
}

/// Chi-square test of independence. Tables with a single degree of freedom get
/// the Yates continuity correction.
pub fn chi_square_table(table: &ContingencyTable) -> Result<ChiSquareResult, InsightError> {
    if table.rows.len() < 2 || table.columns.len() < 2 {
        return Err(InsightError::Computation(format!(
            "contingency table of {} x {} needs at least two categories on each side",
            table.row_column.header(),
            table.col_column.header()
        )));
    }

    let row_totals: Vec<f64> = table
        .counts
        .iter()
        .map(|row| row.iter().sum::<u64>() as f64)
        .collect();
    let col_totals: Vec<f64> = (0..table.columns.len())
        .map(|j| table.counts.iter().map(|row| row[j]).sum::<u64>() as f64)
        .collect();
    let total: f64 = row_totals.iter().sum();

    let dof = (table.rows.len() - 1) * (table.columns.len() - 1);
    let mut statistic = 0.0;

    for (i, row) in table.counts.iter().enumerate() {
        for (j, observed) in row.iter().enumerate() {
            let expected = row_totals[i] * col_totals[j] / total;
            if expected <= 0.0 {
                return Err(InsightError::Computation(
                    "expected frequency of zero in contingency table".to_string(),
                ));
            }
            let mut deviation = (*observed as f64 - expected).abs();
            if dof == 1 {
                deviation = (deviation - 0.5).max(0.0);
            }
            statistic += deviation * deviation / expected;
        }
    }

    let distribution = ChiSquared::new(dof as f64)
        .map_err(|err| InsightError::Computation(format!("chi-square distribution: {err}")))?;
    let p_value = distribution.sf(statistic);

    Ok(ChiSquareResult {
        statistic,
        p_value,
        dof,
        significant: p_value < SIGNIFICANCE_LEVEL,
    })
}

pub fn chi_square(
    view: &FilteredView<'_>,
    row_column: TextColumn,
    col_column: TextColumn,
) -> Result<ChiSquareResult, InsightError> {
    for column in [row_column, col_column] {
        if !view.has(column) {
            return Err(InsightError::MissingColumn(column.header().to_string()));
        }
    }
    chi_square_table(&contingency_table(view, row_column, col_column))
}

/// One-way ANOVA of `target` across the groups formed by `group`.
pub fn anova(
    view: &FilteredView<'_>,
    group: TextColumn,
    target: NumericColumn,
) -> Result<AnovaResult, InsightError> {
    if !view.has(group) {
        return Err(InsightError::MissingColumn(group.header().to_string()));
    }
    if !view.has(target) {
        return Err(InsightError::MissingColumn(target.header().to_string()));
    }

    let groups: Vec<Vec<f64>> = insight::grouped_values(view, group, target)
        .into_values()
        .filter(|values| !values.is_empty())
        .collect();

    if groups.len() < 2 {
        return Err(InsightError::InsufficientData(format!(
            "insufficient groups: {} needs at least two non-empty groups",
            group.header()
        )));
    }

    let observations: usize = groups.iter().map(Vec::len).sum();
    let df_between = groups.len() - 1;
    let df_within = observations - groups.len();
    if df_within == 0 {
        return Err(InsightError::Computation(
            "every group holds a single observation".to_string(),
        ));
    }

    let grand_mean = groups.iter().flatten().sum::<f64>() / observations as f64;
    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for values in &groups {
        let group_mean = values.iter().sum::<f64>() / values.len() as f64;
        ss_between += values.len() as f64 * (group_mean - grand_mean).powi(2);
        ss_within += values
            .iter()
            .map(|value| (value - group_mean).powi(2))
            .sum::<f64>();
    }

    if ss_within == 0.0 {
        return Err(InsightError::Computation(
            "groups have no within-group variance".to_string(),
        ));
    }

    let f_statistic = (ss_between / df_between as f64) / (ss_within / df_within as f64);
    let distribution = FisherSnedecor::new(df_between as f64, df_within as f64)
        .map_err(|err| InsightError::Computation(format!("F distribution: {err}")))?;
    let p_value = distribution.sf(f_statistic);

    Ok(AnovaResult {
        f_statistic,
        p_value,
        df_between,
        df_within,
        groups: groups.len(),
        significant: p_value < SIGNIFICANCE_LEVEL,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, Dataset, Record};

    fn pairs(cells: &[(&str, &str, usize)]) -> Dataset {
        let mut records = Vec::new();
        for (specialization, industry, count) in cells {
            for _ in 0..*count {
                records.push(Record {
                    specialization: Some(specialization.to_string()),
                    industry_sector: Some(industry.to_string()),
                    ..Record::default()
                });
            }
        }
        Dataset {
            records,
            columns: vec![
                Column::Text(TextColumn::Specialization),
                Column::Text(TextColumn::IndustrySector),
            ],
            extra_columns: Vec::new(),
        }
    }

    #[test]
    fn two_by_two_table_uses_continuity_correction() {
        let data = pairs(&[
            ("A", "X", 10),
            ("A", "Y", 20),
            ("B", "X", 30),
            ("B", "Y", 40),
        ]);
        let view = FilteredView::all(&data);

        let table = contingency_table(
            &view,
            TextColumn::Specialization,
            TextColumn::IndustrySector,
        );
        assert_eq!(table.counts, vec![vec![10, 20], vec![30, 40]]);

        let result = chi_square(
            &view,
            TextColumn::Specialization,
            TextColumn::IndustrySector,
        )
        .expect("chi-square");
        assert_eq!(result.dof, 1);
        assert!((result.statistic - 0.446_428_571).abs() < 1e-6);
        assert!(result.p_value > 0.49 && result.p_value < 0.52);
        assert!(!result.significant);
    }

    #[test]
    fn strong_association_is_significant() {
        let data = pairs(&[
            ("Sistem Tenaga", "Energi", 40),
            ("Sistem Tenaga", "Telekomunikasi", 2),
            ("Telekomunikasi", "Energi", 3),
            ("Telekomunikasi", "Telekomunikasi", 38),
            ("Elektronika", "Manufaktur", 25),
            ("Elektronika", "Energi", 4),
        ]);
        let result = chi_square(
            &FilteredView::all(&data),
            TextColumn::Specialization,
            TextColumn::IndustrySector,
        )
        .expect("chi-square");

        assert_eq!(result.dof, 4);
        assert!(result.significant);
        assert!(result.p_value < 1e-6);
    }

    #[test]
    fn single_category_table_is_reported_not_panicked() {
        let data = pairs(&[("A", "X", 3), ("A", "Y", 4)]);
        let err = chi_square(
            &FilteredView::all(&data),
            TextColumn::Specialization,
            TextColumn::IndustrySector,
        )
        .expect_err("degenerate");
        assert!(matches!(err, InsightError::Computation(_)));
    }

    fn salaries_by_location(rows: &[(&str, f64)]) -> Dataset {
        Dataset {
            records: rows
                .iter()
                .map(|(location, salary)| Record {
                    location: Some(location.to_string()),
                    salary: Some(*salary),
                    ..Record::default()
                })
                .collect(),
            columns: vec![
                Column::Text(TextColumn::Location),
                Column::Numeric(NumericColumn::Salary),
            ],
            extra_columns: Vec::new(),
        }
    }

    #[test]
    fn anova_separates_distinct_group_means() {
        let data = salaries_by_location(&[
            ("Banten", 1.0),
            ("Banten", 2.0),
            ("Banten", 3.0),
            ("Jawa Barat", 4.0),
            ("Jawa Barat", 5.0),
            ("Jawa Barat", 6.0),
        ]);
        let result = anova(
            &FilteredView::all(&data),
            TextColumn::Location,
            NumericColumn::Salary,
        )
        .expect("anova");

        assert!((result.f_statistic - 13.5).abs() < 1e-9);
        assert_eq!(result.df_between, 1);
        assert_eq!(result.df_within, 4);
        assert!(result.p_value > 0.015 && result.p_value < 0.03);
        assert!(result.significant);
    }

    #[test]
    fn anova_with_one_group_reports_insufficient_groups() {
        let data = salaries_by_location(&[("Banten", 1.0), ("Banten", 2.0)]);
        let err = anova(
            &FilteredView::all(&data),
            TextColumn::Location,
            NumericColumn::Salary,
        )
        .expect_err("one group");

        match err {
            InsightError::InsufficientData(message) => {
                assert!(message.contains("insufficient groups"))
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn anova_without_spread_is_a_computation_error() {
        let data = salaries_by_location(&[
            ("Banten", 5.0),
            ("Banten", 5.0),
            ("Bali", 7.0),
            ("Bali", 7.0),
        ]);
        let err = anova(
            &FilteredView::all(&data),
            TextColumn::Location,
            NumericColumn::Salary,
        )
        .expect_err("zero variance");
        assert!(matches!(err, InsightError::Computation(_)));
    }

    #[test]
    fn anova_requires_both_columns() {
        let data = salaries_by_location(&[("Banten", 5.0)]);
        let err = anova(
            &FilteredView::all(&data),
            TextColumn::Program,
            NumericColumn::Salary,
        )
        .expect_err("missing");
        assert!(matches!(err, InsightError::MissingColumn(_)));
    }
}
