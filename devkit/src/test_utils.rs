/*!
Helpers de tests

- Logging des tests via `tracing-subscriber` (sortie capturée par cargo test)
- Attente active d'une condition avec timeout
- Adresse garantie injoignable pour simuler une panne réseau
*/

use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Init logging pour tests, sans erreur si déjà initialisé
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Attend que `cond` devienne vraie (vérifiée toutes les 10ms)
pub async fn wait_until<F>(timeout: Duration, mut cond: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

/// URL de base vers un port local libéré : toute connexion est refusée
pub async fn unreachable_address() -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}/", addr))
}
