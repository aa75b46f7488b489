//! Small helpers shared by the service.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use tracing::info;

/// Length of generated slugs.
pub const SLUG_LEN: usize = 13;

const SLUG_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-z]{1,32}$").unwrap());

/// Random lowercase base36 slug for share links.
pub fn generate_slug() -> String {
    let mut rng = rand::thread_rng();
    (0..SLUG_LEN)
        .map(|_| SLUG_ALPHABET[rng.gen_range(0..SLUG_ALPHABET.len())] as char)
        .collect()
}

/// Whether `slug` has a shape the service could have generated.
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received");
}
