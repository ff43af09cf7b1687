use std::sync::Arc;

use porthole_ai::{OpenAiGenerator, QueryGenerator};
use porthole_db::{DbContext, Documents};

use porthole_api::routes;
use porthole_api::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mongo_uri = std::env::var("PORTHOLE_MONGO_URI")
        .unwrap_or_else(|_| "mongodb://127.0.0.1:27017".into());
    let default_db = std::env::var("PORTHOLE_DB").unwrap_or_else(|_| "app".into());
    let api_addr = std::env::var("PORTHOLE_API_ADDR").unwrap_or_else(|_| "0.0.0.0:9700".into());

    let ctx = Arc::new(DbContext::new(&mongo_uri, &default_db));
    let docs = Arc::new(Documents::new(ctx));

    // Generation stays off unless an AI endpoint and key are both configured.
    let generator: Option<Arc<dyn QueryGenerator>> = match (
        std::env::var("PORTHOLE_AI_URL"),
        std::env::var("PORTHOLE_AI_KEY"),
    ) {
        (Ok(url), Ok(key)) => {
            let model =
                std::env::var("PORTHOLE_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
            let generator = OpenAiGenerator::new(&url, &key, &model).unwrap_or_else(|e| {
                eprintln!("failed to build ai client for {url}: {e}");
                std::process::exit(1);
            });
            Some(Arc::new(generator))
        }
        _ => None,
    };
    if generator.is_none() {
        tracing::info!("query generation disabled (PORTHOLE_AI_URL / PORTHOLE_AI_KEY not set)");
    }

    let state = AppState { docs, generator };

    let app = routes::router().with_state(state);

    let listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("failed to bind {api_addr}: {e}");
            std::process::exit(1);
        });

    // The URI may carry credentials, log only the database name.
    tracing::info!("porthole-api listening on {api_addr} (database: {default_db})");
    axum::serve(listener, app).await.unwrap();
}
