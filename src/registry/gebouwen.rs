use crate::core::client::{RegistryClient, RequestError};
use crate::core::selector::{is_historic_status, select_unit};
use crate::domain::model::{BuildingOutcome, BuildingUnit};
use crate::registry::wkt::geometry_to_wkt;
use crate::registry::{first_text, loose_string, Identificator};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

pub const DEFAULT_GEBOUWEN_URL: &str = "https://api.basisregisters.vlaanderen.be/v2/gebouwen";
pub const DEFAULT_GEBOUWEENHEDEN_URL: &str =
    "https://api.basisregisters.vlaanderen.be/v2/gebouweenheden";

#[derive(Error, Debug)]
pub enum BuildingLookupError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Building unit has neither a detail URL nor an object id")]
    MissingDetailUrl,

    #[error("No building id found for building unit {0}")]
    MissingBuildingId(String),
}

/// `GET /v2/gebouweenheden?adresobjectId=..` body. The unit list is required.
#[derive(Debug, Deserialize)]
pub struct UnitListResponse {
    pub gebouweenheden: Vec<UnitSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnitSummary {
    pub identificator: Option<Identificator>,
    #[serde(deserialize_with = "loose_string")]
    pub detail: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub gebouweenheid_status: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub status: Option<String>,
}

impl UnitSummary {
    pub fn to_unit(&self) -> BuildingUnit {
        let status = first_text([self.gebouweenheid_status.as_ref(), self.status.as_ref()])
            .map(str::to_string);
        BuildingUnit {
            object_id: self
                .identificator
                .as_ref()
                .and_then(Identificator::object_id)
                .map(str::to_string),
            detail_url: first_text([self.detail.as_ref()]).map(str::to_string),
            is_historic: status.as_deref().is_some_and(is_historic_status),
            status,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UnitDetail {
    #[serde(rename = "gebouwId", alias = "gebouwid", deserialize_with = "loose_string")]
    pub gebouw_id: Option<String>,
    pub gebouw: Option<GebouwRef>,
    pub relatie: Option<Relatie>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GebouwRef {
    pub identificator: Option<Identificator>,
    #[serde(deserialize_with = "loose_string")]
    pub id: Option<String>,
    #[serde(rename = "objectId", alias = "objectid", deserialize_with = "loose_string")]
    pub object_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Relatie {
    #[serde(rename = "gebouwId", alias = "gebouwid", deserialize_with = "loose_string")]
    pub gebouw_id: Option<String>,
}

impl UnitDetail {
    pub fn building_id(&self) -> Option<&str> {
        if let Some(id) = first_text([self.gebouw_id.as_ref()]) {
            return Some(id);
        }
        if let Some(gebouw) = &self.gebouw {
            let from_ident = gebouw.identificator.as_ref().and_then(Identificator::object_id);
            if let Some(id) =
                from_ident.or_else(|| first_text([gebouw.id.as_ref(), gebouw.object_id.as_ref()]))
            {
                return Some(id);
            }
        }
        self.relatie
            .as_ref()
            .and_then(|r| first_text([r.gebouw_id.as_ref()]))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GeometryHolder {
    pub geometrie: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GebouwDetail {
    pub gebouw_polygoon: Option<GeometryHolder>,
    pub gebouw_lijn: Option<GeometryHolder>,
    pub gebouw_punt: Option<GeometryHolder>,
}

impl GebouwDetail {
    /// Footprint polygon first, then line, then point.
    pub fn wkt(&self) -> Option<String> {
        [&self.gebouw_polygoon, &self.gebouw_lijn, &self.gebouw_punt]
            .into_iter()
            .flatten()
            .filter_map(|holder| holder.geometrie.as_ref())
            .find_map(geometry_to_wkt)
    }
}

/// `{base}/{segment}` with the segment percent-encoded.
pub fn join_url(base: &str, segment: &str) -> Result<String, RequestError> {
    let invalid = |message: String| RequestError::InvalidUrl {
        url: base.to_string(),
        message,
    };
    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("URL cannot have path segments".to_string()))?
        .pop_if_empty()
        .push(segment);
    Ok(url.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GebouwenSettings {
    pub gebouwen_url: String,
    pub gebouweenheden_url: String,
    pub building_limit: usize,
    pub include_historic: bool,
}

impl Default for GebouwenSettings {
    fn default() -> Self {
        Self {
            gebouwen_url: DEFAULT_GEBOUWEN_URL.to_string(),
            gebouweenheden_url: DEFAULT_GEBOUWEENHEDEN_URL.to_string(),
            building_limit: 5,
            include_historic: false,
        }
    }
}

/// Address id → building unit → building → footprint lookup chain.
pub struct GebouwenApi {
    client: Arc<RegistryClient>,
    settings: GebouwenSettings,
}

impl GebouwenApi {
    pub fn new(client: Arc<RegistryClient>, settings: GebouwenSettings) -> Self {
        Self { client, settings }
    }

    pub async fn lookup(&self, adres_id: &str) -> BuildingOutcome {
        match self.try_lookup(adres_id).await {
            Ok(outcome) => outcome,
            Err(e) => BuildingOutcome::Error(e.to_string()),
        }
    }

    async fn try_lookup(&self, adres_id: &str) -> Result<BuildingOutcome, BuildingLookupError> {
        let units = self.fetch_units(adres_id).await?;
        let Some(unit) = select_unit(&units, self.settings.include_historic) else {
            tracing::debug!("adres {}: {} units, none selectable", adres_id, units.len());
            return Ok(BuildingOutcome::NoMatch);
        };

        let detail = self.fetch_unit_detail(unit).await?;
        let building_id = detail
            .building_id()
            .ok_or_else(|| {
                BuildingLookupError::MissingBuildingId(
                    unit.object_id.clone().unwrap_or_default(),
                )
            })?
            .to_string();

        let url = join_url(&self.settings.gebouwen_url, &building_id)?;
        let building: GebouwDetail = self.client.get_json(&url, &[]).await?;

        Ok(match building.wkt() {
            Some(wkt) => BuildingOutcome::Matched { building_id, wkt },
            None => BuildingOutcome::MatchedNoGeometry { building_id },
        })
    }

    pub async fn fetch_units(&self, adres_id: &str) -> Result<Vec<BuildingUnit>, RequestError> {
        let query = vec![
            ("adresobjectId".to_string(), adres_id.to_string()),
            (
                "limit".to_string(),
                self.settings.building_limit.max(1).to_string(),
            ),
        ];
        let response: UnitListResponse = self
            .client
            .get_json(&self.settings.gebouweenheden_url, &query)
            .await?;
        Ok(response
            .gebouweenheden
            .iter()
            .map(UnitSummary::to_unit)
            .collect())
    }

    async fn fetch_unit_detail(&self, unit: &BuildingUnit) -> Result<UnitDetail, BuildingLookupError> {
        let url = match (&unit.detail_url, &unit.object_id) {
            (Some(detail), _) => detail.clone(),
            (None, Some(object_id)) => join_url(&self.settings.gebouweenheden_url, object_id)?,
            (None, None) => return Err(BuildingLookupError::MissingDetailUrl),
        };
        Ok(self.client.get_json(&url, &[]).await?)
    }
}
