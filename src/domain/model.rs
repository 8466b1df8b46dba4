use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// One CSV row, keyed by column name. Column order lives on the owning [`Table`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub data: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trimmed value of `column`, `None` when absent or blank.
    pub fn field(&self, column: &str) -> Option<&str> {
        self.data
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn get(&self, column: &str) -> &str {
        self.data.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.data.insert(column.to_string(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(headers: Vec<String>, records: Vec<Record>) -> Self {
        Self { headers, records }
    }

    /// Appends every column not yet present, in the given order.
    pub fn ensure_columns(&mut self, columns: &[&str]) {
        for column in columns {
            if !self.headers.iter().any(|h| h == column) {
                self.headers.push(column.to_string());
            }
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Values of `record` in header order, blanks for missing cells.
    pub fn row_values<'a>(&'a self, record: &'a Record) -> impl Iterator<Item = &'a str> + 'a {
        self.headers.iter().map(move |h| record.get(h))
    }
}

/// Validated input for one adresmatch query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub municipality: Option<String>,
    pub street: String,
    pub house_number: String,
    pub box_number: Option<String>,
    pub postal_code: Option<String>,
}

impl QueryParams {
    /// Query string pairs in the adresmatch API's vocabulary.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("straatnaam".to_string(), self.street.clone()),
            ("huisnummer".to_string(), self.house_number.clone()),
        ];
        if let Some(municipality) = &self.municipality {
            query.push(("gemeentenaam".to_string(), municipality.clone()));
        }
        if let Some(box_number) = &self.box_number {
            query.push(("busnummer".to_string(), box_number.clone()));
        }
        if let Some(postal_code) = &self.postal_code {
            query.push(("postcode".to_string(), postal_code.clone()));
        }
        query
    }
}

/// Flattened fields of the best adresmatch candidate, already formatted for CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdresFields {
    pub score: String,
    pub adres_uri: String,
    pub adres_id: String,
    pub identificator_namespace: String,
    pub identificator_version: String,
    pub gemeente: String,
    pub straatnaam: String,
    pub huisnummer: String,
    pub busnummer: String,
    pub postcode: String,
    pub toevoeging: String,
    pub pos_method: String,
    pub pos_lon: String,
    pub pos_lat: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdresmatchOutcome {
    Matched(Box<AdresFields>),
    NoMatch,
    MissingInput(String),
    Error(String),
}

impl AdresmatchOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            AdresmatchOutcome::Matched(_) => "matched",
            AdresmatchOutcome::NoMatch => "no_match",
            AdresmatchOutcome::MissingInput(_) => "missing_input",
            AdresmatchOutcome::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildingOutcome {
    Matched { building_id: String, wkt: String },
    MatchedNoGeometry { building_id: String },
    NoMatch,
    MissingAdresId(String),
    Error(String),
}

impl BuildingOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            BuildingOutcome::Matched { .. } => "matched",
            BuildingOutcome::MatchedNoGeometry { .. } => "matched_no_geometry",
            BuildingOutcome::NoMatch => "no_match",
            BuildingOutcome::MissingAdresId(_) => "missing_adres_id",
            BuildingOutcome::Error(_) => "error",
        }
    }
}

/// A building unit candidate as listed for one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingUnit {
    pub object_id: Option<String>,
    pub detail_url: Option<String>,
    pub status: Option<String>,
    pub is_historic: bool,
}

/// Per-file counters, keyed by status value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total_rows: usize,
    pub evaluated: usize,
    pub skipped: usize,
    pub by_status: BTreeMap<String, usize>,
}

impl RunStats {
    pub fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            ..Self::default()
        }
    }

    pub fn record(&mut self, status: &str) {
        self.evaluated += 1;
        *self.by_status.entry(status.to_string()).or_insert(0) += 1;
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn count(&self, status: &str) -> usize {
        self.by_status.get(status).copied().unwrap_or(0)
    }

    pub fn summary(&self) -> String {
        if self.by_status.is_empty() {
            return "no rows evaluated".to_string();
        }
        self.by_status
            .iter()
            .map(|(status, count)| format!("{}={}", status, count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Output of a pipeline's transform step.
#[derive(Debug, Clone)]
pub struct EnrichmentResult {
    pub table: Table,
    pub stats: RunStats,
    pub elapsed: Duration,
}
