use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use clap::ValueEnum;
use serde::Serialize;
use tracing::debug;

use crate::error::{DataLoadError, InsightError};
use crate::loader;
use crate::models::{Column, Dataset, NumericColumn, Record, TextColumn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    #[value(alias = "year")]
    CohortYear,
    Program,
    Specialization,
    Location,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::CohortYear,
        Criterion::Program,
        Criterion::Specialization,
        Criterion::Location,
    ];

    pub fn column(self) -> Column {
        match self {
            Criterion::CohortYear => Column::Numeric(NumericColumn::CohortYear),
            Criterion::Program => Column::Text(TextColumn::Program),
            Criterion::Specialization => Column::Text(TextColumn::Specialization),
            Criterion::Location => Column::Text(TextColumn::Location),
        }
    }

    pub fn value_of(self, record: &Record) -> Option<FilterValue> {
        match self.column() {
            Column::Numeric(_) => record.cohort_year.map(FilterValue::Year),
            Column::Text(column) => column
                .value(record)
                .map(|value| FilterValue::Text(value.to_string())),
        }
    }

    pub fn parse_value(self, raw: &str) -> Result<FilterValue, InsightError> {
        let raw = raw.trim();
        match self.column() {
            Column::Numeric(_) => raw.parse::<i32>().map(FilterValue::Year).map_err(|_| {
                InsightError::InvalidSelection(format!("'{raw}' is not a cohort year"))
            }),
            Column::Text(column) => loader::normalize_text(column, raw)
                .map(FilterValue::Text)
                .ok_or_else(|| {
                    InsightError::InvalidSelection(format!("empty {}", column.header()))
                }),
        }
    }

    fn accepts(self, value: &FilterValue) -> bool {
        matches!(
            (self, value),
            (Criterion::CohortYear, FilterValue::Year(_))
                | (
                    Criterion::Program | Criterion::Specialization | Criterion::Location,
                    FilterValue::Text(_)
                )
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Year(i32),
    Text(String),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Year(year) => write!(f, "{year}"),
            FilterValue::Text(text) => f.write_str(text),
        }
    }
}

/// Allowed values per criterion. An empty set places no restriction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterState {
    selections: BTreeMap<Criterion, BTreeSet<FilterValue>>,
    #[serde(skip)]
    initialized: bool,
}

impl FilterState {
    /// Selects every observed value. Only the first call has an effect.
    pub fn init_defaults(&mut self, dataset: &Dataset) {
        if self.initialized {
            return;
        }
        self.reset(dataset);
    }

    pub fn reset(&mut self, dataset: &Dataset) {
        self.selections.clear();
        for criterion in Criterion::ALL {
            if !dataset.has(criterion.column()) {
                continue;
            }
            let observed: BTreeSet<FilterValue> = dataset
                .records
                .iter()
                .filter_map(|record| criterion.value_of(record))
                .collect();
            debug!(?criterion, values = observed.len(), "filter defaults");
            self.selections.insert(criterion, observed);
        }
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn read(&self) -> &BTreeMap<Criterion, BTreeSet<FilterValue>> {
        &self.selections
    }

    pub fn selection(&self, criterion: Criterion) -> Option<&BTreeSet<FilterValue>> {
        self.selections.get(&criterion)
    }

    pub fn write<I>(&mut self, criterion: Criterion, values: I) -> Result<(), InsightError>
    where
        I: IntoIterator<Item = FilterValue>,
    {
        let values: BTreeSet<FilterValue> = values.into_iter().collect();
        if let Some(value) = values.iter().find(|value| !criterion.accepts(value)) {
            return Err(InsightError::InvalidSelection(format!(
                "{value} is not a valid {} value",
                criterion.column().header()
            )));
        }
        debug!(?criterion, values = values.len(), "filter updated");
        self.selections.insert(criterion, values);
        Ok(())
    }
}

/// The records that satisfy every active criterion, in dataset order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    rows: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    pub fn all(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            rows: dataset.records.iter().collect(),
        }
    }

    pub fn records(&self) -> &[&'a Record] {
        &self.rows
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn has(&self, column: impl Into<Column>) -> bool {
        self.dataset.has(column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Non-null values of `column`, in view order.
    pub fn numbers(&self, column: NumericColumn) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|record| column.value(record))
            .collect()
    }

    pub fn texts(&self, column: TextColumn) -> impl Iterator<Item = &'a str> + '_ {
        self.rows
            .iter()
            .copied()
            .filter_map(move |record| column.value(record))
    }
}

pub fn apply<'a>(dataset: &'a Dataset, filters: &FilterState) -> FilteredView<'a> {
    let active: Vec<(Criterion, &BTreeSet<FilterValue>)> = filters
        .read()
        .iter()
        .filter(|(criterion, allowed)| {
            !allowed.is_empty() && dataset.has(criterion.column())
        })
        .map(|(criterion, allowed)| (*criterion, allowed))
        .collect();

    let rows = dataset
        .records
        .iter()
        .filter(|record| {
            active.iter().all(|(criterion, allowed)| {
                criterion
                    .value_of(record)
                    .is_some_and(|value| allowed.contains(&value))
            })
        })
        .collect();

    FilteredView { dataset, rows }
}

/// One interactive session: a shared dataset handle and the filter state that
/// every view of the session is computed against.
#[derive(Debug, Clone)]
pub struct Session {
    dataset: Arc<Dataset>,
    filters: FilterState,
}

impl Session {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        let mut filters = FilterState::default();
        filters.init_defaults(&dataset);
        Self { dataset, filters }
    }

    pub fn open(path: &Path) -> Result<Self, DataLoadError> {
        Ok(Self::new(loader::load(path)?))
    }

    /// Re-reads the dataset handle. Filter defaults are kept as they were.
    pub fn reload(&mut self, path: &Path) -> Result<(), DataLoadError> {
        self.dataset = loader::load(path)?;
        if self.filters.is_initialized() {
            debug!(
                path = %path.display(),
                "dataset reloaded, keeping existing filter defaults"
            );
        }
        self.filters.init_defaults(&self.dataset);
        Ok(())
    }

    pub fn reset_filters(&mut self) {
        self.filters.reset(&self.dataset);
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterState {
        &mut self.filters
    }

    pub fn view(&self) -> FilteredView<'_> {
        apply(&self.dataset, &self.filters)
    }

    pub fn full_view(&self) -> FilteredView<'_> {
        FilteredView::all(&self.dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: Option<i32>, program: &str, location: Option<&str>) -> Record {
        Record {
            cohort_year: year,
            program: Some(program.to_string()),
            location: location.map(str::to_string),
            ..Record::default()
        }
    }

    fn dataset() -> Dataset {
        Dataset {
            records: vec![
                record(Some(2018), "Teknik Elektro", Some("Jawa Barat")),
                record(Some(2019), "Teknik Elektro", Some("DKI Jakarta")),
                record(Some(2019), "Teknik Informatika", None),
                record(None, "Teknik Informatika", Some("Jawa Barat")),
                record(Some(2020), "Teknik Elektro", Some("Banten")),
            ],
            columns: vec![
                Column::Numeric(NumericColumn::CohortYear),
                Column::Text(TextColumn::Program),
                Column::Text(TextColumn::Location),
            ],
            extra_columns: Vec::new(),
        }
    }

    fn text(value: &str) -> FilterValue {
        FilterValue::Text(value.to_string())
    }

    #[test]
    fn defaults_cover_every_observed_value() {
        let dataset = dataset();
        let mut filters = FilterState::default();
        filters.init_defaults(&dataset);

        let years = filters.selection(Criterion::CohortYear).expect("years");
        assert_eq!(
            years.iter().cloned().collect::<Vec<_>>(),
            vec![
                FilterValue::Year(2018),
                FilterValue::Year(2019),
                FilterValue::Year(2020)
            ]
        );
        assert!(filters.selection(Criterion::Specialization).is_none());
        assert_eq!(
            filters.selection(Criterion::Location).map(BTreeSet::len),
            Some(3)
        );
    }

    #[test]
    fn init_defaults_is_idempotent() {
        let dataset = dataset();
        let mut filters = FilterState::default();
        filters.init_defaults(&dataset);
        filters
            .write(Criterion::Program, [text("Teknik Elektro")])
            .expect("write");

        filters.init_defaults(&dataset);
        assert_eq!(
            filters.selection(Criterion::Program).map(BTreeSet::len),
            Some(1)
        );

        filters.reset(&dataset);
        assert_eq!(
            filters.selection(Criterion::Program).map(BTreeSet::len),
            Some(2)
        );
    }

    #[test]
    fn filtered_records_satisfy_every_non_empty_criterion() {
        let dataset = dataset();
        let mut filters = FilterState::default();
        filters
            .write(
                Criterion::CohortYear,
                [FilterValue::Year(2019), FilterValue::Year(2020)],
            )
            .expect("write");
        filters
            .write(Criterion::Program, [text("Teknik Elektro")])
            .expect("write");

        let view = apply(&dataset, &filters);
        assert_eq!(view.len(), 2);
        for record in view.records() {
            assert!(matches!(record.cohort_year, Some(2019 | 2020)));
            assert_eq!(record.program.as_deref(), Some("Teknik Elektro"));
        }
    }

    #[test]
    fn empty_selections_leave_dataset_untouched() {
        let dataset = dataset();
        let mut filters = FilterState::default();
        for criterion in Criterion::ALL {
            filters.write(criterion, []).expect("write");
        }

        let view = apply(&dataset, &filters);
        assert_eq!(view.len(), dataset.len());
        for (kept, original) in view.records().iter().zip(&dataset.records) {
            assert!(std::ptr::eq(*kept, original));
        }
    }

    #[test]
    fn defaults_keep_rows_with_values_and_drop_nulls() {
        let dataset = dataset();
        let mut filters = FilterState::default();
        filters.init_defaults(&dataset);

        // Default sets are non-empty, so rows missing a year or location drop out.
        assert_eq!(apply(&dataset, &filters).len(), 3);
    }

    #[test]
    fn apply_is_repeatable() {
        let dataset = dataset();
        let mut filters = FilterState::default();
        filters
            .write(Criterion::Location, [text("Jawa Barat")])
            .expect("write");

        let first: Vec<*const Record> = apply(&dataset, &filters)
            .records()
            .iter()
            .map(|record| *record as *const Record)
            .collect();
        let second: Vec<*const Record> = apply(&dataset, &filters)
            .records()
            .iter()
            .map(|record| *record as *const Record)
            .collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn criteria_for_absent_columns_are_skipped() {
        let dataset = dataset();
        let mut filters = FilterState::default();
        filters
            .write(Criterion::Specialization, [text("Sistem Tenaga")])
            .expect("write");

        assert_eq!(apply(&dataset, &filters).len(), dataset.len());
    }

    #[test]
    fn write_rejects_values_of_the_wrong_kind() {
        let mut filters = FilterState::default();
        let err = filters
            .write(Criterion::CohortYear, [text("2019")])
            .expect_err("text year");
        assert!(matches!(err, InsightError::InvalidSelection(_)));
    }

    #[test]
    fn parse_value_normalizes_locations() {
        assert_eq!(
            Criterion::Location.parse_value("  jakarta "),
            Ok(text("DKI Jakarta"))
        );
        assert_eq!(
            Criterion::CohortYear.parse_value("2020"),
            Ok(FilterValue::Year(2020))
        );
        assert!(Criterion::CohortYear.parse_value("twenty").is_err());
    }

    #[test]
    fn text_selections_match_loaded_spelling() {
        let loaded = loader::parse_records(
            "Program Studi,Konsentrasi\nTeknik   Elektro, Sistem  Tenaga\nTeknik Informatika,Jaringan\n"
                .as_bytes(),
            Path::new("inline.csv"),
        )
        .expect("parse");
        let mut filters = FilterState::default();
        filters.init_defaults(&loaded);

        let program = Criterion::Program
            .parse_value(" Teknik   Elektro ")
            .expect("program");
        assert_eq!(program, text("Teknik Elektro"));
        filters.write(Criterion::Program, [program]).expect("write");
        assert_eq!(apply(&loaded, &filters).len(), 1);

        let specialization = Criterion::Specialization
            .parse_value("Sistem \t Tenaga")
            .expect("specialization");
        filters
            .write(Criterion::Specialization, [specialization])
            .expect("write");
        assert_eq!(apply(&loaded, &filters).len(), 1);

        assert!(Criterion::Program.parse_value("   ").is_err());
    }

    #[test]
    fn session_views_follow_its_own_filters() {
        let mut session = Session::new(Arc::new(dataset()));
        assert!(session.filters().is_initialized());

        session
            .filters_mut()
            .write(Criterion::Location, [text("Banten")])
            .expect("write");
        assert_eq!(session.view().len(), 1);
        assert_eq!(session.full_view().len(), 5);

        session.reset_filters();
        assert_eq!(session.view().len(), 3);
    }
}
