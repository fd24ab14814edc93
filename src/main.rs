use anyhow::Context;
use std::sync::Arc;
use yoco_subscriptions::{
    App, AppContext, ConfigBuilder, StoreBackend,
    gateway::YocoClient,
    payments::PaymentsModule,
    subscriptions::{FirestoreSubscriptionStore, InMemorySubscriptionStore, SubscriptionStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigBuilder::new().from_env().build()?;
    yoco_subscriptions::init_tracing_with_config(&config.logging);

    let secret_key = config
        .gateway
        .secret_key
        .clone()
        .context("YOCO_SECRET_KEY is required")?;
    let gateway = YocoClient::new(secret_key, config.gateway.client.clone())?;
    tracing::info!(
        live = gateway.is_live_mode(),
        timeout_seconds = gateway.timeout().as_secs(),
        "Yoco client ready"
    );

    let store: Arc<dyn SubscriptionStore> = match config.store.backend {
        StoreBackend::Firestore => {
            let store = FirestoreSubscriptionStore::new(&config.store.firestore)
                .context("Failed to initialise Firestore store")?;
            tracing::info!(
                project_id = config.store.firestore.project_id.as_deref().unwrap_or_default(),
                collection = %config.store.firestore.collection,
                emulator = config.store.firestore.uses_emulator(),
                "Firestore store ready"
            );
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory subscription store; data is lost on restart");
            Arc::new(InMemorySubscriptionStore::new())
        }
    };

    let context = AppContext::builder()
        .with_gateway(Arc::new(gateway))
        .with_store(store)
        .build()?;

    App::new(config, context)
        .register_module(PaymentsModule)
        .serve()
        .await
}
