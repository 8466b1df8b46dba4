use crate::core::client::RegistryClient;
use crate::domain::model::{AdresFields, AdresmatchOutcome, QueryParams};
use crate::registry::{first_text, lenient, loose_string, value_text, Identificator};
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};

pub const DEFAULT_API_URL: &str = "https://api.basisregisters.vlaanderen.be/v2/adresmatch";

static GML_POS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<gml:pos>([^<]+)</gml:pos>").expect("valid gml:pos pattern"));

/// `GET /v2/adresmatch` body. The match list is required.
#[derive(Debug, Deserialize)]
pub struct AdresMatchResponse {
    #[serde(rename = "adresMatches")]
    pub adres_matches: Vec<AdresMatchItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdresMatchItem {
    #[serde(default, deserialize_with = "lenient")]
    pub score: Option<f64>,
    /// Older payloads nest the address; newer ones inline it in the match.
    #[serde(default, deserialize_with = "lenient")]
    pub adres: Option<AdresBody>,
    #[serde(flatten)]
    pub inline: AdresBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdresBody {
    #[serde(deserialize_with = "lenient")]
    pub identificator: Option<Identificator>,
    #[serde(deserialize_with = "loose_string")]
    pub detail: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub gemeente: Option<Naam>,
    #[serde(deserialize_with = "lenient")]
    pub gemeentenaam: Option<Naam>,
    #[serde(deserialize_with = "lenient")]
    pub straatnaam: Option<Naam>,
    #[serde(deserialize_with = "loose_string")]
    pub huisnummer: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub busnummer: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub toevoeging: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub postinfo: Option<Postinfo>,
    #[serde(alias = "positie", deserialize_with = "lenient")]
    pub adres_positie: Option<Positie>,
}

/// A name object: `{geografischeNaam: {spelling}}`, `{spelling}`, or a
/// reference that wraps one of those under `gemeentenaam`/`straatnaam`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Naam {
    #[serde(deserialize_with = "lenient")]
    pub geografische_naam: Option<GeografischeNaam>,
    #[serde(deserialize_with = "loose_string")]
    pub spelling: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub gemeentenaam: Option<Box<Naam>>,
    #[serde(deserialize_with = "lenient")]
    pub straatnaam: Option<Box<Naam>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GeografischeNaam {
    #[serde(deserialize_with = "loose_string")]
    pub spelling: Option<String>,
}

impl Naam {
    pub fn spelling(&self) -> Option<&str> {
        let direct = first_text([
            self.geografische_naam
                .as_ref()
                .and_then(|g| g.spelling.as_ref()),
            self.spelling.as_ref(),
        ]);
        direct
            .or_else(|| self.gemeentenaam.as_deref().and_then(Naam::spelling))
            .or_else(|| self.straatnaam.as_deref().and_then(Naam::spelling))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Postinfo {
    #[serde(deserialize_with = "loose_string")]
    pub postnummer: Option<String>,
    #[serde(alias = "objectid", deserialize_with = "loose_string")]
    pub object_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Positie {
    #[serde(deserialize_with = "loose_string")]
    pub positie_geometrie_methode: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub methode: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub geometrie: Option<PuntGeometrie>,
    #[serde(deserialize_with = "lenient")]
    pub punt: Option<Punt>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PuntGeometrie {
    #[serde(deserialize_with = "loose_string")]
    pub gml: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub coordinates: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Punt {
    #[serde(deserialize_with = "loose_string")]
    pub xcoordinaat: Option<String>,
    #[serde(deserialize_with = "loose_string")]
    pub ycoordinaat: Option<String>,
}

/// Lon/lat text from the first `<gml:pos>` element. A single value yields
/// only the longitude.
pub fn parse_gml_coordinates(gml: &str) -> (String, String) {
    let Some(caps) = GML_POS.captures(gml) else {
        return (String::new(), String::new());
    };
    let mut parts = caps[1].split_whitespace();
    let lon = parts.next().unwrap_or_default().to_string();
    let lat = parts.next().unwrap_or_default().to_string();
    (lon, lat)
}

fn position_fields(positie: &Positie) -> (String, String, String) {
    let method = first_text([
        positie.positie_geometrie_methode.as_ref(),
        positie.methode.as_ref(),
    ])
    .unwrap_or_default()
    .to_string();

    let (mut lon, mut lat) = (String::new(), String::new());
    if let Some(geometrie) = &positie.geometrie {
        if let Some(gml) = &geometrie.gml {
            (lon, lat) = parse_gml_coordinates(gml);
        }
        if lon.is_empty() || lat.is_empty() {
            if let Some(coords) = geometrie.coordinates.as_ref().filter(|c| c.len() >= 2) {
                if lon.is_empty() {
                    lon = value_text(coords[0].clone()).unwrap_or_default();
                }
                if lat.is_empty() {
                    lat = value_text(coords[1].clone()).unwrap_or_default();
                }
            }
        }
    }
    if lon.is_empty() || lat.is_empty() {
        if let Some(punt) = &positie.punt {
            if lon.is_empty() {
                lon = punt.xcoordinaat.clone().unwrap_or_default();
            }
            if lat.is_empty() {
                lat = punt.ycoordinaat.clone().unwrap_or_default();
            }
        }
    }
    (method, lon, lat)
}

impl AdresMatchItem {
    pub fn body(&self) -> &AdresBody {
        self.adres.as_ref().unwrap_or(&self.inline)
    }

    pub fn to_fields(&self) -> AdresFields {
        let adres = self.body();
        let text = |value: Option<&str>| value.unwrap_or_default().to_string();

        let mut fields = AdresFields {
            score: self.score.map(|s| format!("{:.4}", s)).unwrap_or_default(),
            gemeente: text(
                adres
                    .gemeentenaam
                    .as_ref()
                    .and_then(Naam::spelling)
                    .or_else(|| adres.gemeente.as_ref().and_then(Naam::spelling)),
            ),
            straatnaam: text(adres.straatnaam.as_ref().and_then(Naam::spelling)),
            huisnummer: text(adres.huisnummer.as_deref()),
            busnummer: text(adres.busnummer.as_deref()),
            toevoeging: text(adres.toevoeging.as_deref()),
            postcode: text(adres.postinfo.as_ref().and_then(|p| {
                first_text([p.postnummer.as_ref(), p.object_id.as_ref()])
            })),
            ..AdresFields::default()
        };

        match &adres.identificator {
            Some(ident) => {
                fields.adres_uri = text(first_text([ident.id.as_ref(), adres.detail.as_ref()]));
                fields.adres_id = text(ident.object_id());
                fields.identificator_namespace =
                    text(first_text([ident.naamruimte.as_ref(), ident.namespace.as_ref()]));
                fields.identificator_version =
                    text(first_text([ident.versie_id.as_ref(), ident.versie.as_ref()]));
            }
            None => fields.adres_uri = text(adres.detail.as_deref()),
        }

        if let Some(positie) = &adres.adres_positie {
            (fields.pos_method, fields.pos_lon, fields.pos_lat) = position_fields(positie);
        }
        fields
    }
}

/// Maps a decoded response onto the row outcome: first match or no match.
pub fn outcome_from_response(response: &AdresMatchResponse) -> AdresmatchOutcome {
    match response.adres_matches.first() {
        Some(best) => AdresmatchOutcome::Matched(Box::new(best.to_fields())),
        None => AdresmatchOutcome::NoMatch,
    }
}

/// The address-matching endpoint.
pub struct AdresmatchApi {
    client: Arc<RegistryClient>,
    url: String,
}

impl AdresmatchApi {
    pub fn new(client: Arc<RegistryClient>, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub async fn lookup(&self, params: &QueryParams) -> AdresmatchOutcome {
        match self
            .client
            .get_json::<AdresMatchResponse>(&self.url, &params.to_query())
            .await
        {
            Ok(response) => outcome_from_response(&response),
            Err(e) => AdresmatchOutcome::Error(e.to_string()),
        }
    }
}
