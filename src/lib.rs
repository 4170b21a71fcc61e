use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};

pub mod application;
pub mod domain;
pub mod infrastructure;
#[cfg(feature = "http-service")]
pub mod interfaces;
pub mod settings;

use application::services::{HospitalStore, StoreContextProvider, UserStore};
use application::{AuthService, HospitalService, QnaService};
use infrastructure::SledDirectoryStore;
use settings::ConfigManager;

/// Log filter used when `MEDIDIR_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,medidir_lib=debug";

/// Fully wired services over one opened store.
pub struct AppHandles {
    pub hospitals: Arc<HospitalService>,
    pub auth: Arc<AuthService>,
    pub qna: Arc<QnaService>,
    pub config: Arc<ConfigManager>,
    pub data_dir: PathBuf,
}

/// Loads `<data_dir>/config.json`, opens `<data_dir>/store` and builds the services.
///
/// The sled database holds an exclusive lock, so only one environment may be
/// built per data directory at a time.
pub fn build_environment(data_dir: impl Into<PathBuf>) -> Result<AppHandles> {
    let data_dir = data_dir.into();

    let config = Arc::new(ConfigManager::load(&data_dir).context("failed to load config file")?);
    let active_config = config.current();

    let store_path = data_dir.join("store");
    let store = SledDirectoryStore::open_with_cache(
        &store_path,
        active_config.storage.cache_capacity_bytes(),
    )
    .map_err(|err| anyhow!(err.to_string()))
    .context("failed to open embedded store")?;
    let store = Arc::new(store);

    let hospital_store: Arc<dyn HospitalStore> = store.clone();
    let user_store: Arc<dyn UserStore> = store;

    let hospitals = Arc::new(HospitalService::new(Arc::clone(&hospital_store)));
    let auth = Arc::new(AuthService::new(user_store, active_config.auth.token_ttl()));
    let qna = Arc::new(QnaService::new(Arc::new(StoreContextProvider::new(
        hospital_store,
    ))));

    Ok(AppHandles {
        hospitals,
        auth,
        qna,
        config,
        data_dir,
    })
}

/// Installs the global subscriber once. Output goes to stderr.
#[cfg(any(feature = "http-service", feature = "cli"))]
pub fn init_tracing() {
    static INIT: std::sync::OnceLock<()> = std::sync::OnceLock::new();

    let _ = INIT.get_or_init(|| {
        let filter =
            std::env::var("MEDIDIR_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .try_init();
    });
}

/// Runs the HTTP service until Ctrl+C or SIGTERM.
#[cfg(feature = "http-service")]
pub async fn run_service() -> Result<()> {
    use tracing::info;

    init_tracing();
    info!(
        "Starting medidir service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let handles = tokio::task::spawn_blocking(|| {
        let data_dir = settings::resolve_data_dir()?;
        build_environment(data_dir)
    })
    .await
    .context("initialization task panicked")??;

    info!("Data directory: {}", handles.data_dir.display());
    info!("Config file: {}", handles.config.path().display());

    let addr = handles.config.current().with_env_overrides().bind_addr()?;
    let state = interfaces::HttpState {
        hospitals: handles.hospitals,
        auth: handles.auth,
        qna: handles.qna,
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("medidir listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    interfaces::http::serve(listener, state, shutdown_signal())
        .await
        .context("server failed")?;

    info!("medidir service stopped");
    Ok(())
}

#[cfg(feature = "http-service")]
async fn shutdown_signal() {
    use tracing::{info, warn};

    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(err) => {
                warn!(error = %err, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
