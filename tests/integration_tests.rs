use adres_enrich::adapters::storage::read_csv;
use adres_enrich::adapters::{LocalStorage, ReqwestTransport, TokioClock};
use adres_enrich::app::pipelines::{AdresmatchPipeline, GebouwenPipeline, RunOptions};
use adres_enrich::config::toml_config::FileConfig;
use adres_enrich::config::{AdresmatchConfig, GebouwenConfig, GebouwenOverrides, HttpOverrides};
use adres_enrich::core::jobs::{plan_jobs, OutputTarget, Stage};
use adres_enrich::registry::adresmatch::AdresmatchApi;
use adres_enrich::registry::gebouwen::GebouwenApi;
use adres_enrich::utils::validation::Validate;
use adres_enrich::{EnrichmentEngine, RateLimiter, RegistryClient};
use httpmock::prelude::*;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const BOM: &[u8] = b"\xEF\xBB\xBF";

fn client(config_http: &adres_enrich::config::HttpSettings) -> Arc<RegistryClient> {
    let limiter = RateLimiter::new(Arc::new(TokioClock), config_http.rate_limit, config_http.delay());
    Arc::new(RegistryClient::new(
        Arc::new(ReqwestTransport::new().unwrap()),
        limiter,
        config_http.client_settings(),
    ))
}

fn fast_overrides() -> HttpOverrides {
    HttpOverrides {
        rate_limit: Some(0.0),
        retry_wait_seconds: Some(0.0),
        retries: Some(1),
        ..HttpOverrides::default()
    }
}

async fn run_adresmatch(config: &AdresmatchConfig, input: &Path, options: RunOptions) {
    let client = client(&config.http);
    for job in plan_jobs(Stage::Adresmatch, input, &OutputTarget::default()).unwrap() {
        let api = AdresmatchApi::new(client.clone(), config.api_url.clone());
        let pipeline = AdresmatchPipeline::new(LocalStorage::new(), api, job, options.clone());
        EnrichmentEngine::new(pipeline).run().await.unwrap();
    }
}

#[tokio::test]
async fn test_adresmatch_in_place_and_idempotent() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("adressen.csv");
    let mut content = BOM.to_vec();
    content.extend_from_slice(
        "id,LOM_MUN_NM,LOM_ROAD_NM,LOM_SOURCE_HNR,LOM_BOXNR,LOM_POSTAL_CD\n\
         1,Gent,Kerkstraat,12,,9000\n\
         2,Gent,,3,,\n\
         3,Brugge,Markt,1,A,8000\n"
            .as_bytes(),
    );
    std::fs::write(&input, content)?;

    let server = MockServer::start();
    let gent = server.mock(|when, then| {
        when.method(GET)
            .path("/v2/adresmatch")
            .query_param("gemeentenaam", "Gent")
            .query_param("straatnaam", "Kerkstraat")
            .query_param("huisnummer", "12")
            .query_param("postcode", "9000");
        then.status(200).json_body(json!({"adresMatches": [{
            "score": 100,
            "identificator": {"id": "https://data.vlaanderen.be/id/adres/1001", "naamruimte": "https://data.vlaanderen.be/id/adres", "objectId": "1001", "versieId": "1"},
            "gemeente": {"gemeentenaam": {"geografischeNaam": {"spelling": "Gent"}}},
            "straatnaam": {"straatnaam": {"geografischeNaam": {"spelling": "Kerkstraat"}}},
            "huisnummer": "12",
            "postinfo": {"objectId": "9000"},
            "adresPositie": {"geometrie": {"gml": "<gml:Point><gml:pos>104000.5 194000.25</gml:pos></gml:Point>"}, "positieGeometrieMethode": "afgeleidVanObject"}
        }]}));
    });
    let brugge = server.mock(|when, then| {
        when.method(GET)
            .path("/v2/adresmatch")
            .query_param("gemeentenaam", "Brugge")
            .query_param("busnummer", "A");
        then.status(200).json_body(json!({"adresMatches": []}));
    });

    let config = AdresmatchConfig::resolve(
        &fast_overrides(),
        Some(server.url("/v2/adresmatch")),
        &FileConfig::default(),
    );
    config.validate()?;

    run_adresmatch(&config, &input, RunOptions::default()).await;
    gent.assert_hits(1);
    brugge.assert_hits(1);

    let bytes = std::fs::read(&input)?;
    assert!(bytes.starts_with(BOM));
    assert!(!bytes[BOM.len()..].starts_with(BOM));

    let table = read_csv(&input)?;
    assert_eq!(table.headers[0], "id");
    assert_eq!(table.headers.len(), 6 + 16);
    let first = &table.records[0];
    assert_eq!(first.get("adresmatch_status"), "matched");
    assert_eq!(first.get("adresmatch_adres_id"), "1001");
    assert_eq!(first.get("adresmatch_gemeente"), "Gent");
    assert_eq!(first.get("adresmatch_pos_lon"), "104000.5");
    assert_eq!(first.get("adresmatch_pos_lat"), "194000.25");
    assert_eq!(table.records[1].get("adresmatch_status"), "missing_input");
    assert_eq!(table.records[2].get("adresmatch_status"), "no_match");

    let before = std::fs::read(&input)?;
    run_adresmatch(&config, &input, RunOptions::default()).await;
    gent.assert_hits(1);
    brugge.assert_hits(1);
    assert_eq!(std::fs::read(&input)?, before);
    Ok(())
}

#[tokio::test]
async fn test_adresmatch_client_error_recorded_per_row() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("in.csv");
    std::fs::write(
        &input,
        "LOM_MUN_NM,LOM_ROAD_NM,LOM_SOURCE_HNR\nGent,Kerkstraat,1\nGent,Kerkstraat,2\n",
    )?;

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/v2/adresmatch");
        then.status(400).body(r#"{"title":"Ongeldige huisnummer"}"#);
    });

    let config = AdresmatchConfig::resolve(
        &fast_overrides(),
        Some(server.url("/v2/adresmatch")),
        &FileConfig::default(),
    );
    run_adresmatch(&config, &input, RunOptions::default()).await;

    mock.assert_hits(2);
    let table = read_csv(&input)?;
    for record in &table.records {
        assert_eq!(record.get("adresmatch_status"), "error");
        assert!(record.get("adresmatch_error").contains("HTTP 400"));
        assert!(record.get("adresmatch_error").contains("Ongeldige huisnummer"));
    }
    Ok(())
}

#[tokio::test]
async fn test_gebouwen_directory_with_config_file() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let input_dir = dir.path().join("in");
    let output_dir = dir.path().join("out");
    std::fs::create_dir(&input_dir)?;
    std::fs::write(input_dir.join("a.csv"), "id,adres_id\nx,11\n")?;
    std::fs::write(input_dir.join("b.csv"), "id,adres_id\ny,\n")?;
    std::fs::write(input_dir.join("a_gebouwen.csv"), "id,adres_id\nz,99\n")?;

    let server = MockServer::start();
    let units = server.mock(|when, then| {
        when.method(GET)
            .path("/v2/gebouweenheden")
            .query_param("adresobjectId", "11")
            .query_param("limit", "2")
            .header("Authorization", "Bearer from-env");
        then.status(200).json_body(json!({"gebouweenheden": [
            {"identificator": {"objectId": "301"}, "gebouweenheidStatus": "gepland"}
        ]}));
    });
    let unit = server.mock(|when, then| {
        when.method(GET).path("/v2/gebouweenheden/301");
        then.status(200).json_body(json!({"gebouw": {"identificator": {"objectId": "4001"}}}));
    });
    let building = server.mock(|when, then| {
        when.method(GET).path("/v2/gebouwen/4001");
        then.status(200).json_body(json!({"gebouwPolygoon": {"geometrie": {
            "gml": "<gml:Polygon><gml:exterior><gml:LinearRing><gml:posList>10 20 11 20 11 21 10 20</gml:posList></gml:LinearRing></gml:exterior></gml:Polygon>"
        }}}));
    });

    std::env::set_var("ADRES_ENRICH_IT_TOKEN", "from-env");
    let config_path = dir.path().join("enrich.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[http]
auth = "${{ADRES_ENRICH_IT_TOKEN}}"
retries = 0
progress_interval = 1

[gebouwen]
gebouwen_url = "{}"
gebouweenheden_url = "{}"
adres_id_field = "adres_id"
building_limit = 2
rate_limit = 0
"#,
            server.url("/v2/gebouwen"),
            server.url("/v2/gebouweenheden")
        ),
    )?;
    let file = FileConfig::from_file(&config_path)?;
    std::env::remove_var("ADRES_ENRICH_IT_TOKEN");

    let config = GebouwenConfig::resolve(&HttpOverrides::default(), GebouwenOverrides::default(), &file);
    config.validate()?;
    assert_eq!(config.http.progress_interval, 1);

    let target = OutputTarget {
        output: None,
        output_dir: Some(output_dir.clone()),
    };
    let jobs = plan_jobs(Stage::Gebouwen, &input_dir, &target)?;
    assert_eq!(jobs.len(), 2);

    let client = client(&config.http);
    let options = RunOptions {
        progress_interval: config.http.progress_interval,
        ..RunOptions::default()
    };
    for job in jobs {
        let api = GebouwenApi::new(client.clone(), config.api.clone());
        let pipeline = GebouwenPipeline::new(
            LocalStorage::new(),
            api,
            config.adres_id_field.clone(),
            job,
            options.clone(),
        );
        EnrichmentEngine::new(pipeline).run().await?;
    }

    units.assert_hits(1);
    unit.assert_hits(1);
    building.assert_hits(1);

    let a = read_csv(&output_dir.join("a.csv"))?;
    assert_eq!(a.records[0].get("gebouwregister_status"), "matched");
    assert_eq!(a.records[0].get("gebouwregister_id"), "4001");
    assert_eq!(
        a.records[0].get("gebouwregister_wkt"),
        "POLYGON ((10 20, 11 20, 11 21, 10 20))"
    );

    let b = read_csv(&output_dir.join("b.csv"))?;
    assert_eq!(b.records[0].get("gebouwregister_status"), "missing_adres_id");
    assert!(!output_dir.join("a_gebouwen.csv").exists());

    let untouched = std::fs::read_to_string(input_dir.join("a.csv"))?;
    assert_eq!(untouched, "id,adres_id\nx,11\n");
    Ok(())
}
