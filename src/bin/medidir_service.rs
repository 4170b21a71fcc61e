//! Long-running HTTP service for the hospital directory.
//!
//! # Environment Variables
//!
//! - `MEDIDIR_LOG`: tracing filter (default `info,medidir_lib=debug`)
//! - `MEDIDIR_DATA_DIR`: override the data directory
//! - `MEDIDIR_SERVICE_HOST`: bind address (default: 127.0.0.1)
//! - `MEDIDIR_SERVICE_PORT`: bind port (default: 5000)

#[cfg(feature = "http-service")]
#[tokio::main]
async fn main() {
    if let Err(err) = medidir_lib::run_service().await {
        eprintln!("[medidir::service] Service failed: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "http-service"))]
fn main() {
    eprintln!("[medidir::service] Build with the `http-service` feature to enable the service.");
    eprintln!("Example: cargo build --release --bin medidir-service --features http-service");
    std::process::exit(1);
}
