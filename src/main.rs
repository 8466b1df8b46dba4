use adres_enrich::adapters::{LocalStorage, ReqwestTransport, TokioClock};
use adres_enrich::app::pipelines::{AdresmatchPipeline, GebouwenPipeline};
use adres_enrich::config::cli::{Cli, Command};
use adres_enrich::config::HttpSettings;
use adres_enrich::core::jobs::{plan_jobs, Stage};
use adres_enrich::domain::ports::Pipeline;
use adres_enrich::registry::adresmatch::AdresmatchApi;
use adres_enrich::registry::gebouwen::GebouwenApi;
use adres_enrich::utils::{logger, validation::Validate};
use adres_enrich::{EnrichmentEngine, RateLimiter, RegistryClient, Result, RunReport};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let common = cli.command.common();

    if common.log_json {
        logger::init_json_logger(common.verbose);
    } else {
        logger::init_cli_logger(common.verbose);
    }

    if let Err(e) = run(&cli.command).await {
        tracing::error!(
            "Run failed: {} (category: {:?}, severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("Suggestion: {}", e.recovery_suggestion());
        eprintln!("{}", e.user_friendly_message());
        eprintln!("{}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}

async fn run(command: &Command) -> Result<()> {
    let common = command.common();
    let file_config = common.file_config()?;
    if common.monitor {
        tracing::info!("Resource monitoring enabled");
    }

    match command {
        Command::Adresmatch(args) => {
            let config = args.resolve(&file_config);
            config.validate()?;
            let jobs = plan_jobs(Stage::Adresmatch, &common.input, &common.output_target())?;
            let client = build_client(&config.http)?;
            let options = common.run_options(&config.http);

            for job in jobs {
                let api = AdresmatchApi::new(client.clone(), config.api_url.clone());
                let pipeline =
                    AdresmatchPipeline::new(LocalStorage::new(), api, job, options.clone());
                report(run_pipeline(pipeline).await?);
            }
        }
        Command::Gebouwen(args) => {
            let config = args.resolve(&file_config);
            config.validate()?;
            let jobs = plan_jobs(Stage::Gebouwen, &common.input, &common.output_target())?;
            let client = build_client(&config.http)?;
            let options = common.run_options(&config.http);

            for job in jobs {
                let api = GebouwenApi::new(client.clone(), config.api.clone());
                let pipeline = GebouwenPipeline::new(
                    LocalStorage::new(),
                    api,
                    config.adres_id_field.clone(),
                    job,
                    options.clone(),
                );
                report(run_pipeline(pipeline).await?);
            }
        }
    }
    Ok(())
}

/// One client per run, so the rate limit holds across input files.
fn build_client(http: &HttpSettings) -> Result<Arc<RegistryClient>> {
    tracing::debug!(
        "HTTP settings: rate {}/s, timeout {}s, retries {}",
        http.rate_limit,
        http.timeout_seconds,
        http.retries
    );
    let limiter = RateLimiter::new(Arc::new(TokioClock), http.rate_limit, http.delay());
    let transport = ReqwestTransport::new()?;
    Ok(Arc::new(RegistryClient::new(
        Arc::new(transport),
        limiter,
        http.client_settings(),
    )))
}

async fn run_pipeline<P: Pipeline>(pipeline: P) -> Result<RunReport> {
    EnrichmentEngine::new(pipeline).run().await
}

fn report(run: RunReport) {
    println!(
        "Processed {} rows ({} skipped): {}. Output written to {}.",
        run.stats.evaluated,
        run.stats.skipped,
        run.stats.summary(),
        run.output
    );
}
