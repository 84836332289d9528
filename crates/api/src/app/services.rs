use std::sync::Arc;

use stockroom_contacts::ContactsService;
use stockroom_core::RecordLookup;
use stockroom_infra::InMemoryCatalog;
use stockroom_products::ProductsService;

use crate::config::AppConfig;

/// Services the controllers delegate to, shared by every request.
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<dyn ProductsService>,
    pub contacts: Arc<dyn ContactsService>,
    /// Answers the `exists`/`unique` validation checks.
    pub lookup: Arc<dyn RecordLookup>,
}

impl AppServices {
    pub fn new(
        products: Arc<dyn ProductsService>,
        contacts: Arc<dyn ContactsService>,
        lookup: Arc<dyn RecordLookup>,
    ) -> Self {
        Self {
            products,
            contacts,
            lookup,
        }
    }

    /// One in-memory catalog behind all three interfaces.
    pub fn in_memory() -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        Self::new(catalog.clone(), catalog.clone(), catalog)
    }

    #[cfg(feature = "postgres")]
    pub async fn postgres(database_url: &str) -> anyhow::Result<Self> {
        use anyhow::Context;
        use stockroom_infra::PostgresCatalog;

        let pool = sqlx::PgPool::connect(database_url)
            .await
            .context("failed to connect to DATABASE_URL")?;
        let catalog = Arc::new(PostgresCatalog::new(pool));
        catalog.ensure_schema().await?;
        Ok(Self::new(catalog.clone(), catalog.clone(), catalog))
    }
}

/// Pick the backing store from the configuration.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    if !config.use_persistent_stores {
        tracing::info!("using in-memory catalog");
        return Ok(AppServices::in_memory());
    }

    #[cfg(feature = "postgres")]
    {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
        tracing::info!("using postgres catalog");
        AppServices::postgres(url).await
    }

    #[cfg(not(feature = "postgres"))]
    {
        anyhow::bail!("USE_PERSISTENT_STORES requires the `postgres` feature")
    }
}
