use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

use crate::error::DataLoadError;
use crate::models::{Column, Dataset, NumericColumn, Record, TextColumn};

static DATASET_CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<Dataset>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Title-cased spellings mapped onto the province names used by the boundary
/// dataset. Anything not listed is kept as written.
const PROVINCE_ALIASES: &[(&str, &str)] = &[
    ("Dki Jakarta", "DKI Jakarta"),
    ("Jakarta", "DKI Jakarta"),
    ("Yogyakarta", "DI Yogyakarta"),
    ("Daerah Istimewa Yogyakarta", "DI Yogyakarta"),
    ("Di Yogyakarta", "DI Yogyakarta"),
    ("Aceh Darussalam", "Aceh"),
    ("Bangka Belitung", "Kep. Bangka Belitung"),
    ("Kepulauan Bangka Belitung", "Kep. Bangka Belitung"),
];

pub const CANONICAL_PROVINCES: &[&str] = &[
    "Aceh",
    "Sumatera Utara",
    "Sumatera Barat",
    "Riau",
    "Kepulauan Riau",
    "Jambi",
    "Sumatera Selatan",
    "Kep. Bangka Belitung",
    "Bengkulu",
    "Lampung",
    "DKI Jakarta",
    "Jawa Barat",
    "Banten",
    "Jawa Tengah",
    "DI Yogyakarta",
    "Jawa Timur",
    "Bali",
    "Nusa Tenggara Barat",
    "Nusa Tenggara Timur",
    "Kalimantan Barat",
    "Kalimantan Tengah",
    "Kalimantan Selatan",
    "Kalimantan Timur",
    "Kalimantan Utara",
    "Sulawesi Utara",
    "Gorontalo",
    "Sulawesi Tengah",
    "Sulawesi Barat",
    "Sulawesi Selatan",
    "Sulawesi Tenggara",
    "Maluku",
    "Maluku Utara",
    "Papua",
    "Papua Barat",
    "Papua Barat Daya",
    "Papua Selatan",
    "Papua Tengah",
    "Papua Pegunungan",
];

#[derive(Debug, Clone)]
enum Slot {
    Known(Column),
    Extra(String),
}

/// Loads and normalizes the dataset at `path`. The result is cached for the
/// lifetime of the process; later calls with the same path never touch the file.
pub fn load(path: &Path) -> Result<Arc<Dataset>, DataLoadError> {
    let mut cache = DATASET_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(dataset) = cache.get(path) {
        debug!(path = %path.display(), "dataset cache hit");
        return Ok(Arc::clone(dataset));
    }

    let file = std::fs::File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = Arc::new(parse_records(file, path)?);
    info!(
        path = %path.display(),
        rows = dataset.len(),
        columns = dataset.columns.len(),
        "dataset loaded"
    );
    if dataset.is_empty() {
        warn!(path = %path.display(), "dataset has a header but no rows");
    }

    cache.insert(path.to_path_buf(), Arc::clone(&dataset));
    Ok(dataset)
}

pub fn parse_records<R: Read>(source: R, origin: &Path) -> Result<Dataset, DataLoadError> {
    let csv_error = |source: csv::Error| DataLoadError::Csv {
        path: origin.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new().from_reader(source);
    let headers = reader.headers().map_err(csv_error)?.clone();
    if headers.iter().all(|header| header.trim().is_empty()) {
        return Err(DataLoadError::EmptyHeader {
            path: origin.to_path_buf(),
        });
    }

    let mut columns = Vec::new();
    let mut extra_columns = Vec::new();
    let slots: Vec<Slot> = headers
        .iter()
        .map(|header| {
            let name = header.trim();
            match Column::from_header(name) {
                Some(column) if !columns.contains(&column) => {
                    columns.push(column);
                    Slot::Known(column)
                }
                _ => {
                    extra_columns.push(name.to_string());
                    Slot::Extra(name.to_string())
                }
            }
        })
        .collect();

    let rows: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .map_err(csv_error)?;

    let mut coerced = 0usize;
    let mut records = Vec::with_capacity(rows.len());

    for row in &rows {
        let mut record = Record::default();

        for (index, slot) in slots.iter().enumerate() {
            let raw = row.get(index).unwrap_or("");
            match slot {
                Slot::Known(Column::Text(column)) => {
                    *column.field_mut(&mut record) = normalize_text(*column, raw);
                }
                Slot::Known(Column::Numeric(column)) => {
                    let value = coerce_number(raw);
                    if value.is_none() && !raw.trim().is_empty() {
                        coerced += 1;
                    }
                    assign_number(&mut record, *column, value);
                }
                Slot::Extra(name) => {
                    if !raw.trim().is_empty() {
                        record.extra.insert(name.clone(), raw.to_string());
                    }
                }
            }
        }

        records.push(record);
    }

    if coerced > 0 {
        warn!(
            path = %origin.display(),
            cells = coerced,
            "unparsable numeric cells treated as missing"
        );
    }

    Ok(Dataset {
        records,
        columns,
        extra_columns,
    })
}

fn parse_plain(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Reads a cell as written when it is a plain number. Otherwise `.` is taken
/// as a thousands separator and `,` as the decimal mark, so `4.500.000`
/// becomes a salary while `3.45` stays a GPA.
pub fn coerce_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    parse_plain(trimmed).or_else(|| parse_plain(&trimmed.replace('.', "").replace(',', ".")))
}

fn assign_number(record: &mut Record, column: NumericColumn, value: Option<f64>) {
    match column {
        NumericColumn::CohortYear => {
            record.cohort_year = value
                .filter(|year| year.fract() == 0.0)
                .filter(|year| *year >= f64::from(i32::MIN) && *year <= f64::from(i32::MAX))
                .map(|year| year as i32);
        }
        NumericColumn::Salary => record.salary = value,
        NumericColumn::Gpa => record.gpa = value,
        NumericColumn::JobSearchMonths => record.job_search_months = value,
        NumericColumn::CurriculumRelevance => record.curriculum_relevance = value,
    }
}

pub fn normalize_text(column: TextColumn, raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }

    match column {
        TextColumn::Location => Some(canonical_province(&title_case(&collapsed))),
        _ => Some(collapsed),
    }
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest.
pub fn title_case(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut inside_word = false;

    for ch in text.chars() {
        if ch.is_alphabetic() {
            if inside_word {
                output.extend(ch.to_lowercase());
            } else {
                output.extend(ch.to_uppercase());
            }
            inside_word = true;
        } else {
            output.push(ch);
            inside_word = false;
        }
    }

    output
}

pub fn canonical_province(name: &str) -> String {
    PROVINCE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| name.to_string())
}

pub fn is_canonical_province(name: &str) -> bool {
    CANONICAL_PROVINCES.contains(&name)
}
