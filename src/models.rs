use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum NumericColumn {
    #[value(alias = "year")]
    CohortYear,
    Salary,
    Gpa,
    #[value(alias = "wait")]
    JobSearchMonths,
    #[value(alias = "relevance")]
    CurriculumRelevance,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 5] = [
        NumericColumn::CohortYear,
        NumericColumn::Salary,
        NumericColumn::Gpa,
        NumericColumn::JobSearchMonths,
        NumericColumn::CurriculumRelevance,
    ];

    /// Attributes offered to the clustering view, in display order.
    pub const CLUSTER_CANDIDATES: [NumericColumn; 5] = [
        NumericColumn::Salary,
        NumericColumn::CohortYear,
        NumericColumn::CurriculumRelevance,
        NumericColumn::Gpa,
        NumericColumn::JobSearchMonths,
    ];

    pub fn header(self) -> &'static str {
        match self {
            NumericColumn::CohortYear => "Tahun Angkatan",
            NumericColumn::Salary => "Gaji",
            NumericColumn::Gpa => "IPK",
            NumericColumn::JobSearchMonths => "Masa Tunggu Kerja",
            NumericColumn::CurriculumRelevance => "Relevansi Kurikulum",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NumericColumn::CohortYear => "cohort year",
            NumericColumn::Salary => "salary",
            NumericColumn::Gpa => "GPA",
            NumericColumn::JobSearchMonths => "job search months",
            NumericColumn::CurriculumRelevance => "curriculum relevance",
        }
    }

    pub fn value(self, record: &Record) -> Option<f64> {
        match self {
            NumericColumn::CohortYear => record.cohort_year.map(f64::from),
            NumericColumn::Salary => record.salary,
            NumericColumn::Gpa => record.gpa,
            NumericColumn::JobSearchMonths => record.job_search_months,
            NumericColumn::CurriculumRelevance => record.curriculum_relevance,
        }
    }

    /// Decimal places used when a mean of this column is shown.
    pub fn display_decimals(self) -> i32 {
        match self {
            NumericColumn::CohortYear | NumericColumn::JobSearchMonths => 0,
            _ => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TextColumn {
    Program,
    Specialization,
    Location,
    #[value(alias = "industry")]
    IndustrySector,
    Company,
    Position,
    Feedback,
}

impl TextColumn {
    pub const ALL: [TextColumn; 7] = [
        TextColumn::Program,
        TextColumn::Specialization,
        TextColumn::Location,
        TextColumn::IndustrySector,
        TextColumn::Company,
        TextColumn::Position,
        TextColumn::Feedback,
    ];

    pub fn header(self) -> &'static str {
        match self {
            TextColumn::Program => "Program Studi",
            TextColumn::Specialization => "Konsentrasi",
            TextColumn::Location => "Lokasi Geografis",
            TextColumn::IndustrySector => "Bidang Industri",
            TextColumn::Company => "Perusahaan",
            TextColumn::Position => "Posisi/Jabatan",
            TextColumn::Feedback => "Umpan Balik",
        }
    }

    pub fn value(self, record: &Record) -> Option<&str> {
        self.field(record).as_deref()
    }

    fn field(self, record: &Record) -> &Option<String> {
        match self {
            TextColumn::Program => &record.program,
            TextColumn::Specialization => &record.specialization,
            TextColumn::Location => &record.location,
            TextColumn::IndustrySector => &record.industry_sector,
            TextColumn::Company => &record.company,
            TextColumn::Position => &record.position,
            TextColumn::Feedback => &record.feedback,
        }
    }

    pub fn field_mut(self, record: &mut Record) -> &mut Option<String> {
        match self {
            TextColumn::Program => &mut record.program,
            TextColumn::Specialization => &mut record.specialization,
            TextColumn::Location => &mut record.location,
            TextColumn::IndustrySector => &mut record.industry_sector,
            TextColumn::Company => &mut record.company,
            TextColumn::Position => &mut record.position,
            TextColumn::Feedback => &mut record.feedback,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Column {
    Numeric(NumericColumn),
    Text(TextColumn),
}

impl Column {
    pub fn header(self) -> &'static str {
        match self {
            Column::Numeric(column) => column.header(),
            Column::Text(column) => column.header(),
        }
    }

    /// Resolves a trimmed source header to its canonical column.
    pub fn from_header(name: &str) -> Option<Column> {
        let numeric = NumericColumn::ALL
            .into_iter()
            .find(|column| column.header() == name)
            .map(Column::Numeric);
        let text = TextColumn::ALL
            .into_iter()
            .find(|column| column.header() == name)
            .map(Column::Text);

        numeric.or(text).or_else(|| {
            let column = match name {
                "tahun_angkatan" | "tahun" | "cohort_year" => {
                    Column::Numeric(NumericColumn::CohortYear)
                }
                "salary" | "gaji_bulanan" | "gaji" => Column::Numeric(NumericColumn::Salary),
                "ipk" | "gpa" => Column::Numeric(NumericColumn::Gpa),
                "masa_tunggu" | "masa_tunggu_kerja_bulan" | "job_search_months" => {
                    Column::Numeric(NumericColumn::JobSearchMonths)
                }
                "relevansi" | "curriculum_relevance" => {
                    Column::Numeric(NumericColumn::CurriculumRelevance)
                }
                "prodi" | "program_studi" | "program" => Column::Text(TextColumn::Program),
                "konsentrasi_keahlian" | "konsentrasi" | "specialization" => {
                    Column::Text(TextColumn::Specialization)
                }
                "lokasi" | "provinsi" | "location" => Column::Text(TextColumn::Location),
                "bidang" | "bidang_industri" | "industry_sector" => {
                    Column::Text(TextColumn::IndustrySector)
                }
                "perusahaan" | "company" => Column::Text(TextColumn::Company),
                "posisi" | "jabatan" | "position" => Column::Text(TextColumn::Position),
                "umpan_balik" | "feedback" => Column::Text(TextColumn::Feedback),
                _ => return None,
            };
            Some(column)
        })
    }
}

impl From<NumericColumn> for Column {
    fn from(column: NumericColumn) -> Self {
        Column::Numeric(column)
    }
}

impl From<TextColumn> for Column {
    fn from(column: TextColumn) -> Self {
        Column::Text(column)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub cohort_year: Option<i32>,
    pub program: Option<String>,
    pub specialization: Option<String>,
    pub location: Option<String>,
    pub industry_sector: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub feedback: Option<String>,
    pub salary: Option<f64>,
    pub gpa: Option<f64>,
    pub job_search_months: Option<f64>,
    pub curriculum_relevance: Option<f64>,
    pub extra: BTreeMap<String, String>,
}

/// Normalized respondents plus the canonical columns the source actually carried,
/// in header order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<Record>,
    pub columns: Vec<Column>,
    pub extra_columns: Vec<String>,
}

impl Dataset {
    pub fn has(&self, column: impl Into<Column>) -> bool {
        let column = column.into();
        self.columns.contains(&column)
    }

    pub fn numeric_columns(&self) -> Vec<NumericColumn> {
        self.columns
            .iter()
            .filter_map(|column| match column {
                Column::Numeric(numeric) => Some(*numeric),
                Column::Text(_) => None,
            })
            .collect()
    }

    pub fn text_columns(&self) -> Vec<TextColumn> {
        self.columns
            .iter()
            .filter_map(|column| match column {
                Column::Text(text) => Some(*text),
                Column::Numeric(_) => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NumericSummary {
    pub column: NumericColumn,
    pub count: usize,
    pub missing: usize,
    pub mean: f64,
    pub std_dev: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub skewed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDominance {
    pub column: TextColumn,
    pub top: CategoryCount,
    pub share: f64,
    pub dominant: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupMean {
    pub group: String,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<NumericColumn>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: NumericColumn, b: NumericColumn) -> Option<f64> {
        let i = self.columns.iter().position(|column| *column == a)?;
        let j = self.columns.iter().position(|column| *column == b)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationPair {
    pub a: NumericColumn,
    pub b: NumericColumn,
    pub r: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, Serialize)]
pub struct Outlier {
    pub position: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierReport {
    pub column: NumericColumn,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
    pub outliers: Vec<Outlier>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub respondents: usize,
    pub mean_salary: Option<f64>,
    pub mean_gpa: Option<f64>,
    pub mean_job_search_months: Option<f64>,
    pub salary_delta_pct: Option<f64>,
    pub top_industry: Option<CategoryCount>,
    pub top_province: Option<CategoryCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinearTrend {
    pub x: NumericColumn,
    pub y: NumericColumn,
    pub slope: f64,
    pub intercept: f64,
    pub r: Option<f64>,
    pub observations: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvinceCount {
    pub province: String,
    pub count: usize,
    pub mapped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sentiment {
    Positive,
    Neutral,
}

impl Sentiment {
    pub fn label(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackSample {
    pub position: usize,
    pub text: String,
    pub sentiment: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContingencyTable {
    pub row_column: TextColumn,
    pub col_column: TextColumn,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub counts: Vec<Vec<u64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub p_value: f64,
    pub dof: usize,
    pub significant: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnovaResult {
    pub f_statistic: f64,
    pub p_value: f64,
    pub df_between: usize,
    pub df_within: usize,
    pub groups: usize,
    pub significant: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Extreme {
    Highest,
    Lowest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Superlative {
    pub column: NumericColumn,
    pub extreme: Extreme,
}

impl Superlative {
    pub fn describe(self) -> String {
        match (self.column, self.extreme) {
            (NumericColumn::JobSearchMonths, Extreme::Lowest) => {
                "fastest job placement".to_string()
            }
            (NumericColumn::JobSearchMonths, Extreme::Highest) => {
                "slowest job placement".to_string()
            }
            (column, Extreme::Highest) => format!("highest {}", column.label()),
            (column, Extreme::Lowest) => format!("lowest {}", column.label()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeMean {
    pub column: NumericColumn,
    pub mean: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub label: usize,
    pub size: usize,
    pub means: Vec<AttributeMean>,
    pub flags: Vec<Superlative>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ClusterAssignment {
    pub position: usize,
    pub label: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterOutcome {
    pub k: usize,
    pub attributes: Vec<NumericColumn>,
    pub assignments: Vec<ClusterAssignment>,
    pub clusters: Vec<ClusterSummary>,
    pub inertia: f64,
}
