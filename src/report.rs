use std::fmt::Write;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use num_format::{Locale, ToFormattedString};
use serde::Serialize;

use crate::cluster;
use crate::config::{
    CLUSTER_SEED, DEFAULT_CLUSTER_COUNT, FEEDBACK_SAMPLE_SEED, FEEDBACK_SAMPLE_SIZE,
    STRONG_CORRELATION, TOP_N,
};
use crate::error::InsightError;
use crate::filter::{FilterState, FilteredView, Session};
use crate::hypothesis;
use crate::insight;
use crate::models::{
    AnovaResult, CategoryCount, CategoryDominance, ChiSquareResult, ClusterOutcome,
    ContingencyTable, CorrelationMatrix, CorrelationPair, Direction, FeedbackSample, GroupMean,
    LinearTrend, NumericColumn, NumericSummary, OutlierReport, Overview, ProvinceCount,
    TextColumn,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewKind {
    Overview,
    Career,
    Stats,
    Sentiment,
    Clusters,
    Correlation,
    Eda,
}

impl ViewKind {
    pub const ALL: [ViewKind; 7] = [
        ViewKind::Overview,
        ViewKind::Career,
        ViewKind::Stats,
        ViewKind::Sentiment,
        ViewKind::Clusters,
        ViewKind::Correlation,
        ViewKind::Eda,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Markdown,
    Json,
}

/// Per-view knobs; anything left unset falls back to the dataset's first
/// suitable column.
#[derive(Debug, Clone)]
pub struct ViewParams {
    pub k: usize,
    pub seed: u64,
    pub attributes: Vec<NumericColumn>,
    pub pair: Option<(NumericColumn, NumericColumn)>,
    pub numeric: Option<NumericColumn>,
    pub category: Option<TextColumn>,
    pub cross: Option<(TextColumn, TextColumn)>,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            k: usize::from(DEFAULT_CLUSTER_COUNT),
            seed: CLUSTER_SEED,
            attributes: Vec::new(),
            pair: None,
            numeric: None,
            category: None,
            cross: None,
        }
    }
}

/// Outcome of one part of a view. Failures stay inside the section.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
    Ready { result: T },
    Unavailable { reason: String },
}

impl<T> From<Result<T, InsightError>> for Section<T> {
    fn from(result: Result<T, InsightError>) -> Self {
        match result {
            Ok(result) => Section::Ready { result },
            Err(err) => Section::Unavailable {
                reason: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewView {
    pub overview: Overview,
    pub specializations: Vec<CategoryCount>,
    pub provinces: Vec<ProvinceCount>,
    pub numeric: Vec<NumericSummary>,
    pub categorical: Vec<CategoryDominance>,
    pub strong_correlations: Vec<CorrelationPair>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CareerView {
    pub respondents: usize,
    pub salary_by_industry: Vec<GroupMean>,
    pub salary_by_location: Vec<GroupMean>,
    pub top_companies: Vec<CategoryCount>,
    pub top_positions: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsView {
    pub respondents: usize,
    pub gpa_vs_job_search: Section<LinearTrend>,
    pub crosstab: Option<ContingencyTable>,
    pub chi_square: Section<ChiSquareResult>,
    pub anova: Section<AnovaResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentimentView {
    pub respondents: usize,
    pub distribution: Vec<CategoryCount>,
    pub samples: Vec<FeedbackSample>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterView {
    pub respondents: usize,
    pub outcome: Section<ClusterOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairInsight {
    pub x: NumericColumn,
    pub y: NumericColumn,
    pub r: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationView {
    pub respondents: usize,
    pub matrix: CorrelationMatrix,
    pub strong: Vec<CorrelationPair>,
    pub pair: Option<Section<PairInsight>>,
    pub distribution: Option<NumericSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryBreakdown {
    pub column: TextColumn,
    pub counts: Vec<CategoryCount>,
    pub dominance: Option<CategoryDominance>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdaView {
    pub respondents: usize,
    pub summaries: Vec<NumericSummary>,
    pub category: Option<CategoryBreakdown>,
    pub outliers: Option<OutlierReport>,
    pub crosstab: Option<ContingencyTable>,
}

pub fn overview_view(view: &FilteredView<'_>, full: &FilteredView<'_>) -> OverviewView {
    let numeric_columns = view.dataset().numeric_columns();
    let matrix = insight::correlation_matrix(view, &numeric_columns);

    OverviewView {
        overview: insight::overview(view, full),
        specializations: insight::value_counts(view, TextColumn::Specialization),
        provinces: insight::province_distribution(view),
        numeric: insight::describe_all(view),
        categorical: view
            .dataset()
            .text_columns()
            .into_iter()
            .take(3)
            .filter_map(|column| insight::dominance(view, column))
            .collect(),
        strong_correlations: insight::strong_correlations(&matrix, STRONG_CORRELATION),
    }
}

pub fn career_view(view: &FilteredView<'_>) -> CareerView {
    CareerView {
        respondents: view.len(),
        salary_by_industry: insight::grouped_mean(
            view,
            TextColumn::IndustrySector,
            NumericColumn::Salary,
        ),
        salary_by_location: insight::grouped_mean(
            view,
            TextColumn::Location,
            NumericColumn::Salary,
        ),
        top_companies: insight::top_n(view, TextColumn::Company, TOP_N),
        top_positions: insight::top_n(view, TextColumn::Position, TOP_N),
    }
}

pub fn stats_view(view: &FilteredView<'_>) -> StatsView {
    let trend = if !view.has(NumericColumn::Gpa) {
        Err(InsightError::MissingColumn(NumericColumn::Gpa.header().to_string()))
    } else if !view.has(NumericColumn::JobSearchMonths) {
        Err(InsightError::MissingColumn(
            NumericColumn::JobSearchMonths.header().to_string(),
        ))
    } else {
        insight::linear_trend(view, NumericColumn::Gpa, NumericColumn::JobSearchMonths)
            .ok_or_else(|| {
                InsightError::InsufficientData(
                    "no spread in GPA across complete rows".to_string(),
                )
            })
    };

    let crosstab = (view.has(TextColumn::Specialization)
        && view.has(TextColumn::IndustrySector))
    .then(|| {
        hypothesis::contingency_table(
            view,
            TextColumn::Specialization,
            TextColumn::IndustrySector,
        )
    });

    StatsView {
        respondents: view.len(),
        gpa_vs_job_search: trend.into(),
        chi_square: hypothesis::chi_square(
            view,
            TextColumn::Specialization,
            TextColumn::IndustrySector,
        )
        .into(),
        crosstab,
        anova: hypothesis::anova(view, TextColumn::Location, NumericColumn::Salary).into(),
    }
}

pub fn sentiment_view(view: &FilteredView<'_>) -> SentimentView {
    SentimentView {
        respondents: view.len(),
        distribution: insight::sentiment_distribution(view),
        samples: insight::feedback_sample(view, FEEDBACK_SAMPLE_SIZE, FEEDBACK_SAMPLE_SEED),
    }
}

pub fn cluster_view(view: &FilteredView<'_>, params: &ViewParams) -> ClusterView {
    let attributes: Vec<NumericColumn> = if params.attributes.is_empty() {
        NumericColumn::CLUSTER_CANDIDATES
            .into_iter()
            .filter(|column| view.has(*column))
            .collect()
    } else {
        params.attributes.clone()
    };

    ClusterView {
        respondents: view.len(),
        outcome: cluster::cluster(view, &attributes, params.k, params.seed).into(),
    }
}

pub fn correlation_view(view: &FilteredView<'_>, params: &ViewParams) -> CorrelationView {
    let matrix = insight::correlation_matrix(view, &view.dataset().numeric_columns());
    let strong = insight::strong_correlations(&matrix, STRONG_CORRELATION);

    let pair = params
        .pair
        .or_else(|| match matrix.columns.as_slice() {
            [x, y, ..] => Some((*x, *y)),
            _ => None,
        })
        .filter(|(x, y)| x != y)
        .map(|(x, y)| {
            let outcome = insight::correlation_matrix(view, &[x, y])
                .get(x, y)
                .map(|r| PairInsight {
                    x,
                    y,
                    r,
                    direction: if r > 0.0 {
                        Direction::Positive
                    } else {
                        Direction::Negative
                    },
                })
                .ok_or_else(|| {
                    InsightError::InsufficientData(format!(
                        "correlation of {} and {} is undefined",
                        x.header(),
                        y.header()
                    ))
                });
            Section::from(outcome)
        });

    let distribution = params
        .numeric
        .or_else(|| matrix.columns.first().copied())
        .and_then(|column| insight::describe(view, column));

    CorrelationView {
        respondents: view.len(),
        matrix,
        strong,
        pair,
        distribution,
    }
}

pub fn eda_view(view: &FilteredView<'_>, params: &ViewParams) -> EdaView {
    let numeric_columns = view.dataset().numeric_columns();
    let text_columns = view.dataset().text_columns();

    let category = params
        .category
        .or_else(|| text_columns.first().copied())
        .filter(|column| view.has(*column))
        .map(|column| CategoryBreakdown {
            column,
            counts: insight::value_counts(view, column),
            dominance: insight::dominance(view, column),
        });

    let outliers = params
        .numeric
        .or_else(|| numeric_columns.first().copied())
        .and_then(|column| insight::outliers(view, column));

    let cross = params.cross.or_else(|| match text_columns.as_slice() {
        [a, b, ..] => Some((*a, *b)),
        _ => None,
    });
    let crosstab = cross
        .filter(|(a, b)| view.has(*a) && view.has(*b))
        .map(|(a, b)| hypothesis::contingency_table(view, a, b));

    EdaView {
        respondents: view.len(),
        summaries: insight::describe_all(view),
        category,
        outliers,
        crosstab,
    }
}

pub fn format_currency(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("Rp {}", (value.round() as i64).to_formatted_string(&Locale::en)),
        None => "-".to_string(),
    }
}

fn format_optional(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(value) => format!("{value:.decimals$}"),
        None => "-".to_string(),
    }
}

fn direction_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Positive => "positive",
        Direction::Negative => "negative",
    }
}

const EMPTY_VIEW: &str = "No respondents match the active filters.";

fn write_numeric_summaries(output: &mut String, summaries: &[NumericSummary]) {
    for summary in summaries {
        let shape = if summary.skewed {
            "skewed, mean and median diverge"
        } else {
            "roughly symmetric"
        };
        let _ = writeln!(
            output,
            "- {}: mean {:.2}, median {:.2}, range [{:.2}, {:.2}], {} values ({} missing), {}",
            summary.column.header(),
            summary.mean,
            summary.median,
            summary.min,
            summary.max,
            summary.count,
            summary.missing,
            shape
        );
    }
}

fn write_strong_pairs(output: &mut String, pairs: &[CorrelationPair]) {
    if pairs.is_empty() {
        let _ = writeln!(
            output,
            "No strong correlations between numeric columns (|r| >= {STRONG_CORRELATION})."
        );
        return;
    }
    for pair in pairs {
        let _ = writeln!(
            output,
            "- {} & {}: r = {:.2} ({})",
            pair.a.header(),
            pair.b.header(),
            pair.r,
            direction_label(pair.direction)
        );
    }
}

fn write_counts(output: &mut String, counts: &[CategoryCount], empty: &str) {
    if counts.is_empty() {
        let _ = writeln!(output, "{empty}");
        return;
    }
    for entry in counts {
        let _ = writeln!(output, "- {}: {}", entry.value, entry.count);
    }
}

fn write_crosstab(output: &mut String, table: &ContingencyTable) {
    let _ = writeln!(
        output,
        "| {} \\ {} | {} |",
        table.row_column.header(),
        table.col_column.header(),
        table.columns.join(" | ")
    );
    let _ = writeln!(output, "|---|{}", "---|".repeat(table.columns.len()));
    for (row, counts) in table.rows.iter().zip(&table.counts) {
        let cells: Vec<String> = counts.iter().map(u64::to_string).collect();
        let _ = writeln!(output, "| {} | {} |", row, cells.join(" | "));
    }
}

fn write_unavailable(output: &mut String, what: &str, reason: &str) {
    let _ = writeln!(output, "_{what} unavailable: {reason}_");
}

pub fn render_filters(filters: &FilterState) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## Active Filters");
    if filters.read().is_empty() {
        let _ = writeln!(output, "No filterable columns in this dataset.");
    }
    for (criterion, values) in filters.read() {
        let listed = if values.is_empty() {
            "(no restriction)".to_string()
        } else {
            values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let _ = writeln!(output, "- {}: {}", criterion.column().header(), listed);
    }
    output
}

pub fn render_overview(view: &OverviewView) -> String {
    let mut output = String::new();
    let overview = &view.overview;
    let _ = writeln!(output, "## Overview");
    if overview.respondents == 0 {
        let _ = writeln!(output, "{EMPTY_VIEW}");
        return output;
    }

    let _ = writeln!(output, "- Respondents: {}", overview.respondents);
    let _ = writeln!(
        output,
        "- Mean salary: {}",
        format_currency(overview.mean_salary)
    );
    let _ = writeln!(
        output,
        "- Mean GPA: {}",
        format_optional(overview.mean_gpa, 2)
    );
    let _ = writeln!(
        output,
        "- Mean job search: {} months",
        format_optional(overview.mean_job_search_months, 1)
    );
    if let Some(delta) = overview.salary_delta_pct {
        let _ = writeln!(output, "- Salary vs. all respondents: {delta:+.1}%");
    }
    if let Some(top) = &overview.top_industry {
        let _ = writeln!(output, "- Dominant industry: {}", top.value);
    }
    if let Some(top) = &overview.top_province {
        let _ = writeln!(
            output,
            "- Top province: {} ({} alumni)",
            top.value, top.count
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Specialization Mix");
    write_counts(
        &mut output,
        &view.specializations,
        "No specialization data.",
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "### Alumni per Province");
    if view.provinces.is_empty() {
        let _ = writeln!(output, "No location data.");
    }
    for province in &view.provinces {
        let marker = if province.mapped { "" } else { " (not on map)" };
        let _ = writeln!(
            output,
            "- {}: {}{}",
            province.province, province.count, marker
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Numeric Columns");
    write_numeric_summaries(&mut output, &view.numeric);

    let _ = writeln!(output);
    let _ = writeln!(output, "### Categorical Columns");
    for entry in &view.categorical {
        let warning = if entry.dominant {
            " - dominant category (>60%)"
        } else {
            ""
        };
        let _ = writeln!(
            output,
            "- {}: most frequent {} ({} rows){}",
            entry.column.header(),
            entry.top.value,
            entry.top.count,
            warning
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Correlations");
    write_strong_pairs(&mut output, &view.strong_correlations);
    output
}

pub fn render_career(view: &CareerView) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## Career & Salary");
    if view.respondents == 0 {
        let _ = writeln!(output, "{EMPTY_VIEW}");
        return output;
    }

    for (title, groups) in [
        ("Mean Salary per Industry", &view.salary_by_industry),
        ("Mean Salary per Location", &view.salary_by_location),
    ] {
        let _ = writeln!(output, "### {title}");
        if groups.is_empty() {
            let _ = writeln!(output, "No salary data for this grouping.");
        }
        for group in groups {
            let _ = writeln!(
                output,
                "- {}: {} ({} alumni)",
                group.group,
                format_currency(Some(group.mean)),
                group.count
            );
        }
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "### Top {TOP_N} Companies");
    write_counts(&mut output, &view.top_companies, "No company data.");
    let _ = writeln!(output);
    let _ = writeln!(output, "### Top {TOP_N} Positions");
    write_counts(&mut output, &view.top_positions, "No position data.");
    output
}

pub fn render_stats(view: &StatsView) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## Statistical Tests");
    if view.respondents == 0 {
        let _ = writeln!(output, "{EMPTY_VIEW}");
        return output;
    }

    let _ = writeln!(output, "### GPA vs Job Search Months");
    match &view.gpa_vs_job_search {
        Section::Ready { result } => {
            let _ = writeln!(
                output,
                "- Trend: months = {:.3} x GPA + {:.3} over {} alumni (r = {})",
                result.slope,
                result.intercept,
                result.observations,
                format_optional(result.r, 2)
            );
        }
        Section::Unavailable { reason } => write_unavailable(&mut output, "Trend", reason),
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Chi-Square: Specialization vs Industry");
    if let Some(table) = &view.crosstab {
        write_crosstab(&mut output, table);
    }
    match &view.chi_square {
        Section::Ready { result } => {
            let _ = writeln!(
                output,
                "- Chi2 = {:.3}, p-value = {:.5}, dof = {}",
                result.statistic, result.p_value, result.dof
            );
            let verdict = if result.significant {
                "Significant association between specialization and industry (p < 0.05)."
            } else {
                "No evidence of association (p >= 0.05)."
            };
            let _ = writeln!(output, "{verdict}");
        }
        Section::Unavailable { reason } => {
            write_unavailable(&mut output, "Chi-square test", reason)
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### ANOVA: Salary across Locations");
    match &view.anova {
        Section::Ready { result } => {
            let _ = writeln!(
                output,
                "- F = {:.3}, p-value = {:.5}, df = ({}, {}) across {} locations",
                result.f_statistic,
                result.p_value,
                result.df_between,
                result.df_within,
                result.groups
            );
            let verdict = if result.significant {
                "Salaries differ significantly between locations (p < 0.05)."
            } else {
                "No evidence of salary differences between locations (p >= 0.05)."
            };
            let _ = writeln!(output, "{verdict}");
        }
        Section::Unavailable { reason } => write_unavailable(&mut output, "ANOVA", reason),
    }
    output
}

pub fn render_sentiment(view: &SentimentView) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## Feedback Sentiment");
    if view.respondents == 0 {
        let _ = writeln!(output, "{EMPTY_VIEW}");
        return output;
    }

    write_counts(&mut output, &view.distribution, "No sentiment labels.");
    let _ = writeln!(output);
    let _ = writeln!(output, "### Sample Feedback");
    if view.samples.is_empty() {
        let _ = writeln!(output, "No feedback text to show.");
    }
    for sample in &view.samples {
        let _ = writeln!(output, "- [{}] {}", sample.sentiment, sample.text);
    }
    output
}

pub fn render_clusters(view: &ClusterView) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## Alumni Clusters (k-means)");
    if view.respondents == 0 {
        let _ = writeln!(output, "{EMPTY_VIEW}");
        return output;
    }

    let outcome = match &view.outcome {
        Section::Ready { result } => result,
        Section::Unavailable { reason } => {
            write_unavailable(&mut output, "Clustering", reason);
            return output;
        }
    };

    let attributes: Vec<&str> = outcome.attributes.iter().map(|column| column.header()).collect();
    let _ = writeln!(
        output,
        "{} alumni in {} clusters on {}",
        outcome.assignments.len(),
        outcome.k,
        attributes.join(", ")
    );

    for summary in &outcome.clusters {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "### Cluster {} ({} alumni)",
            summary.label, summary.size
        );
        for entry in &summary.means {
            let shown = match entry.column {
                NumericColumn::Salary => format_currency(Some(entry.mean)),
                column => format!("{:.*}", column.display_decimals() as usize, entry.mean),
            };
            let _ = writeln!(output, "- Mean {}: {}", entry.column.label(), shown);
        }
        if !summary.flags.is_empty() {
            let notes: Vec<String> = summary.flags.iter().map(|flag| flag.describe()).collect();
            let _ = writeln!(output, "- Highlights: {}", notes.join("; "));
        }
    }
    output
}

pub fn render_correlation(view: &CorrelationView) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## Correlation Analysis");
    if view.respondents == 0 {
        let _ = writeln!(output, "{EMPTY_VIEW}");
        return output;
    }
    if view.matrix.columns.len() < 2 {
        let _ = writeln!(
            output,
            "Not enough numeric columns for correlation analysis."
        );
        return output;
    }

    let headers: Vec<&str> = view.matrix.columns.iter().map(|column| column.header()).collect();
    let _ = writeln!(output, "| | {} |", headers.join(" | "));
    let _ = writeln!(output, "|---|{}", "---|".repeat(headers.len()));
    for (column, row) in view.matrix.columns.iter().zip(&view.matrix.values) {
        let cells: Vec<String> = row.iter().map(|r| format_optional(*r, 2)).collect();
        let _ = writeln!(output, "| {} | {} |", column.header(), cells.join(" | "));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Strong Correlations");
    write_strong_pairs(&mut output, &view.strong);

    if let Some(pair) = &view.pair {
        let _ = writeln!(output);
        let _ = writeln!(output, "### Selected Pair");
        match pair {
            Section::Ready { result } => {
                let _ = writeln!(
                    output,
                    "- {} & {}: r = {:.2} ({})",
                    result.x.header(),
                    result.y.header(),
                    result.r,
                    direction_label(result.direction)
                );
            }
            Section::Unavailable { reason } => write_unavailable(&mut output, "Pair", reason),
        }
    }

    if let Some(summary) = &view.distribution {
        let _ = writeln!(output);
        let _ = writeln!(output, "### Distribution");
        write_numeric_summaries(&mut output, std::slice::from_ref(summary));
    }
    output
}

pub fn render_eda(view: &EdaView) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "## Exploratory Data Analysis");
    if view.respondents == 0 {
        let _ = writeln!(output, "{EMPTY_VIEW}");
        return output;
    }

    let _ = writeln!(output, "### Descriptive Statistics");
    for summary in &view.summaries {
        let _ = writeln!(
            output,
            "- {}: count {}, mean {:.2}, std {}, min {:.2}, Q1 {:.2}, median {:.2}, Q3 {:.2}, max {:.2}",
            summary.column.header(),
            summary.count,
            summary.mean,
            format_optional(summary.std_dev, 2),
            summary.min,
            summary.q1,
            summary.median,
            summary.q3,
            summary.max
        );
    }

    if let Some(breakdown) = &view.category {
        let _ = writeln!(output);
        let _ = writeln!(output, "### Distribution of {}", breakdown.column.header());
        write_counts(&mut output, &breakdown.counts, "No values.");
        if let Some(dominance) = breakdown.dominance.as_ref().filter(|entry| entry.dominant) {
            let _ = writeln!(
                output,
                "{} dominates {} ({:.0}%), interpret comparisons with care.",
                dominance.top.value,
                breakdown.column.header(),
                dominance.share * 100.0
            );
        }
    }

    if let Some(report) = &view.outliers {
        let _ = writeln!(output);
        let _ = writeln!(output, "### Outliers in {}", report.column.header());
        let _ = writeln!(
            output,
            "- Q1 {:.2}, Q3 {:.2}, IQR {:.2}, bounds [{:.2}, {:.2}]",
            report.q1, report.q3, report.iqr, report.lower, report.upper
        );
        let _ = writeln!(output, "- {} outliers found", report.outliers.len());
        for outlier in report.outliers.iter().take(5) {
            let _ = writeln!(output, "  - row {}: {:.2}", outlier.position, outlier.value);
        }
    }

    if let Some(table) = &view.crosstab {
        let _ = writeln!(output);
        let _ = writeln!(output, "### Cross Tabulation");
        write_crosstab(&mut output, table);
    }
    output
}

fn emit<T: Serialize>(
    built: &T,
    format: Format,
    markdown: fn(&T) -> String,
) -> Result<String, serde_json::Error> {
    match format {
        Format::Json => serde_json::to_string_pretty(built),
        Format::Markdown => Ok(markdown(built)),
    }
}

pub fn render(
    kind: ViewKind,
    session: &Session,
    params: &ViewParams,
    format: Format,
) -> Result<String, serde_json::Error> {
    let view = session.view();

    match kind {
        ViewKind::Overview => emit(
            &overview_view(&view, &session.full_view()),
            format,
            render_overview,
        ),
        ViewKind::Career => emit(&career_view(&view), format, render_career),
        ViewKind::Stats => emit(&stats_view(&view), format, render_stats),
        ViewKind::Sentiment => emit(&sentiment_view(&view), format, render_sentiment),
        ViewKind::Clusters => emit(&cluster_view(&view, params), format, render_clusters),
        ViewKind::Correlation => emit(
            &correlation_view(&view, params),
            format,
            render_correlation,
        ),
        ViewKind::Eda => emit(&eda_view(&view, params), format, render_eda),
    }
}

pub fn build_report(
    session: &Session,
    params: &ViewParams,
    generated_at: DateTime<Utc>,
) -> String {
    let mut output = String::new();
    let view = session.view();

    let _ = writeln!(output, "# Alumni Tracer Study Report");
    let _ = writeln!(
        output,
        "Generated {} for {} of {} respondents",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        view.len(),
        session.dataset().len()
    );
    let _ = writeln!(output);
    output.push_str(&render_filters(session.filters()));

    for kind in ViewKind::ALL {
        let section = match kind {
            ViewKind::Overview => render_overview(&overview_view(&view, &session.full_view())),
            ViewKind::Career => render_career(&career_view(&view)),
            ViewKind::Stats => render_stats(&stats_view(&view)),
            ViewKind::Sentiment => render_sentiment(&sentiment_view(&view)),
            ViewKind::Clusters => render_clusters(&cluster_view(&view, params)),
            ViewKind::Correlation => render_correlation(&correlation_view(&view, params)),
            ViewKind::Eda => render_eda(&eda_view(&view, params)),
        };
        let _ = writeln!(output);
        output.push_str(&section);
    }

    output
}
