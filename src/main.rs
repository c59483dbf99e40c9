use std::{net::TcpListener, sync::Arc};

use anyhow::Context;
use env_logger::Env;
use muse::{
    configuration::{get_configuration, Settings},
    domain::Source,
    services::{
        AdapterRegistry, ArenaAdapter, BrowserScraper, Droid, OpenaiClient, Orchestrator,
        PlatformProfile, RelevanceFilter, RelevanceScorer, SearchService, SessionManager,
    },
    startup::run,
};

fn build_registry(
    configuration: &Settings,
    sessions: &Arc<SessionManager>,
) -> anyhow::Result<AdapterRegistry> {
    let arena = ArenaAdapter::new(&configuration.arena).context("Failed to build Are.na client")?;
    let mut registry = AdapterRegistry::new().register(Arc::new(arena));

    for source in Source::ALL {
        let Some(profile) = PlatformProfile::for_source(source) else {
            continue;
        };
        let credentials = configuration.credentials.for_source(source);
        if credentials.is_none() {
            log::warn!("[{}] No credentials configured, platform will be skipped", source);
        }
        registry = registry.register(Arc::new(BrowserScraper::new(
            profile,
            credentials,
            sessions.clone(),
            &configuration.browser,
        )));
    }

    Ok(registry)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration.")?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;

    // Browser is launched lazily on the first authenticated search.
    let droid = Droid::new(&configuration.browser);
    let sessions = Arc::new(SessionManager::new(Arc::new(droid), &configuration.browser));

    let registry = build_registry(&configuration, &sessions)?;
    let filter = RelevanceFilter::new(&configuration.relevance)
        .context("Invalid pattern in relevance.url_blocklist")?;
    let intent_source = OpenaiClient::new(configuration.api_keys.openai.clone(), &configuration.intent);
    if configuration.api_keys.openai.is_none() {
        log::warn!("No OpenAI key configured, searches will use the raw query as intent");
    }

    let search_service = SearchService::new(
        Arc::new(intent_source),
        Orchestrator::new(registry, &configuration.aggregation),
        filter,
        RelevanceScorer::new(&configuration.relevance),
        &configuration.aggregation,
        &configuration.intent,
    );

    log::info!("Listening on {}", address);
    let served = run(listener, search_service)?.await;

    sessions.shutdown().await;
    served.context("Server stopped with an error")
}
