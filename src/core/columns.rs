//! Output column sets and the row updater for both pipeline stages.
//!
//! Every apply writes the whole column set of its stage, so rows that failed
//! and rows that matched share one schema.

use crate::domain::model::{AdresFields, AdresmatchOutcome, BuildingOutcome, Record};

pub const ADRESMATCH_STATUS: &str = "adresmatch_status";
pub const ADRESMATCH_ERROR: &str = "adresmatch_error";

pub const ADRESMATCH_COLUMNS: [&str; 16] = [
    ADRESMATCH_STATUS,
    "adresmatch_score",
    "adresmatch_adres_uri",
    "adresmatch_adres_id",
    "adresmatch_identificator_namespace",
    "adresmatch_identificator_version",
    "adresmatch_gemeente",
    "adresmatch_straatnaam",
    "adresmatch_huisnummer",
    "adresmatch_busnummer",
    "adresmatch_postcode",
    "adresmatch_toevoeging",
    "adresmatch_pos_method",
    "adresmatch_pos_lon",
    "adresmatch_pos_lat",
    ADRESMATCH_ERROR,
];

pub const GEBOUW_STATUS: &str = "gebouwregister_status";
pub const GEBOUW_ID: &str = "gebouwregister_id";
pub const GEBOUW_WKT: &str = "gebouwregister_wkt";
pub const GEBOUW_ERROR: &str = "gebouwregister_error";

pub const GEBOUW_COLUMNS: [&str; 4] = [GEBOUW_STATUS, GEBOUW_ID, GEBOUW_WKT, GEBOUW_ERROR];

const NO_GEOMETRY_MESSAGE: &str = "Building found but no geometry available";
const NO_UNIT_MESSAGE: &str = "No building unit found for address";

/// True when the row already carries a status for this stage and `force` is off.
pub fn should_skip(record: &Record, status_column: &str, force: bool) -> bool {
    !force && record.field(status_column).is_some()
}

fn adres_values(fields: &AdresFields) -> [&str; 14] {
    [
        &fields.score,
        &fields.adres_uri,
        &fields.adres_id,
        &fields.identificator_namespace,
        &fields.identificator_version,
        &fields.gemeente,
        &fields.straatnaam,
        &fields.huisnummer,
        &fields.busnummer,
        &fields.postcode,
        &fields.toevoeging,
        &fields.pos_method,
        &fields.pos_lon,
        &fields.pos_lat,
    ]
}

pub fn apply_adresmatch(record: &mut Record, outcome: &AdresmatchOutcome) {
    let empty = AdresFields::default();
    let (fields, error) = match outcome {
        AdresmatchOutcome::Matched(fields) => (fields.as_ref(), ""),
        AdresmatchOutcome::NoMatch => (&empty, ""),
        AdresmatchOutcome::MissingInput(message) | AdresmatchOutcome::Error(message) => {
            (&empty, message.as_str())
        }
    };

    record.set(ADRESMATCH_STATUS, outcome.status());
    let value_columns = &ADRESMATCH_COLUMNS[1..ADRESMATCH_COLUMNS.len() - 1];
    for (column, value) in value_columns.iter().zip(adres_values(fields)) {
        record.set(column, value);
    }
    record.set(ADRESMATCH_ERROR, error);
}

pub fn apply_building(record: &mut Record, outcome: &BuildingOutcome) {
    let (id, wkt, error) = match outcome {
        BuildingOutcome::Matched { building_id, wkt } => {
            (building_id.as_str(), wkt.as_str(), String::new())
        }
        BuildingOutcome::MatchedNoGeometry { building_id } => {
            (building_id.as_str(), "", NO_GEOMETRY_MESSAGE.to_string())
        }
        BuildingOutcome::NoMatch => ("", "", NO_UNIT_MESSAGE.to_string()),
        BuildingOutcome::MissingAdresId(column) => ("", "", format!("Missing {}", column)),
        BuildingOutcome::Error(message) => ("", "", message.clone()),
    };

    record.set(GEBOUW_STATUS, outcome.status());
    record.set(GEBOUW_ID, id);
    record.set(GEBOUW_WKT, wkt);
    record.set(GEBOUW_ERROR, error);
}
