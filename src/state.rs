use crate::config::Config;
use crate::db::Store;

/// Immutable per-process state handed to every request handler. The store is
/// the only collaborator that outlives a request; everything else a handler
/// needs arrives with the request itself.
#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self { config, store })
    }
}
