use crate::domain::model::BuildingUnit;

/// Statuses the registry uses for units that no longer exist.
const HISTORIC_STATUSES: [&str; 2] = ["gehistoreerd", "afgeschaft"];

pub fn is_historic_status(status: &str) -> bool {
    let status = status.trim();
    HISTORIC_STATUSES
        .iter()
        .any(|h| h.eq_ignore_ascii_case(status))
}

/// First active unit in response order; the first historic one only when
/// `include_historic` is set and nothing active exists.
pub fn select_unit(units: &[BuildingUnit], include_historic: bool) -> Option<&BuildingUnit> {
    let (historic, active): (Vec<&BuildingUnit>, Vec<&BuildingUnit>) =
        units.iter().partition(|u| u.is_historic);

    active
        .first()
        .or_else(|| historic.first().filter(|_| include_historic))
        .copied()
}
