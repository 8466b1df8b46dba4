use crate::domain::model::{QueryParams, Record};

pub const COL_MUNICIPALITY: &str = "LOM_MUN_NM";
pub const COL_STREET: &str = "LOM_ROAD_NM";
pub const COL_HOUSE_NUMBER: &str = "LOM_SOURCE_HNR";
pub const COL_BOX_NUMBER: &str = "LOM_BOXNR";
pub const COL_POSTAL_CODE: &str = "LOM_POSTAL_CD";

pub const MISSING_INPUT_MESSAGE: &str = "Missing municipality/postcode, street, or house number";

/// The row cannot be queried; no request must be issued for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingInput;

impl std::fmt::Display for MissingInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(MISSING_INPUT_MESSAGE)
    }
}

pub fn extract_query(record: &Record) -> Result<QueryParams, MissingInput> {
    let owned = |column: &str| record.field(column).map(str::to_string);

    let municipality = owned(COL_MUNICIPALITY);
    let postal_code = owned(COL_POSTAL_CODE);
    if municipality.is_none() && postal_code.is_none() {
        return Err(MissingInput);
    }

    let (Some(street), Some(house_number)) = (owned(COL_STREET), owned(COL_HOUSE_NUMBER)) else {
        return Err(MissingInput);
    };

    Ok(QueryParams {
        municipality,
        street,
        house_number,
        box_number: owned(COL_BOX_NUMBER),
        postal_code,
    })
}

/// Address id for the building lookup, trimmed.
pub fn extract_adres_id<'a>(record: &'a Record, column: &str) -> Option<&'a str> {
    record.field(column)
}
