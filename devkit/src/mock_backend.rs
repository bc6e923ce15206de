/*!
Mock REST backend pour tests sans matériel réel

Serveur axum lié sur un port éphémère. Chaque chemin reçoit soit une file de
réponses scriptées (consommées dans l'ordre), soit une réponse par défaut.
Toutes les requêtes reçues sont enregistrées pour les assertions.
*/

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Réponse renvoyée par le mock pour une requête
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl MockReply {
    /// 200 avec un corps JSON
    pub fn json(value: &Value) -> Self {
        Self { status: 200, body: value.to_string(), delay: None }
    }

    /// Statut arbitraire avec un corps brut
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into(), delay: None }
    }

    /// 200 avec un corps brut (utile pour du JSON invalide)
    pub fn raw(body: impl Into<String>) -> Self {
        Self::status(200, body)
    }

    /// Retarde l'envoi de la réponse
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Requête reçue par le mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[derive(Default)]
struct Routes {
    scripted: HashMap<String, VecDeque<MockReply>>,
    defaults: HashMap<String, MockReply>,
    requests: Vec<RecordedRequest>,
}

impl Routes {
    fn next_reply(&mut self, path: &str) -> Option<MockReply> {
        if let Some(queue) = self.scripted.get_mut(path) {
            if let Some(reply) = queue.pop_front() {
                return Some(reply);
            }
        }
        self.defaults.get(path).cloned()
    }
}

type SharedRoutes = Arc<Mutex<Routes>>;

/// Backend HTTP simulé
#[derive(Clone)]
pub struct MockBackend {
    addr: SocketAddr,
    routes: SharedRoutes,
    shutdown: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl MockBackend {
    /// Démarre le serveur sur 127.0.0.1 avec un port libre
    pub async fn start() -> Result<Self> {
        let routes: SharedRoutes = Arc::new(Mutex::new(Routes::default()));
        let app = Router::new().fallback(handle).with_state(routes.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!(error = %e, "mock backend stopped");
            }
        });

        tracing::debug!(%addr, "mock backend listening");
        Ok(Self {
            addr,
            routes,
            shutdown: Arc::new(Mutex::new(Some(tx))),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Adresse de base à donner au plugin
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Réponse utilisée quand la file scriptée du chemin est vide
    pub fn set_default(&self, path: &str, reply: MockReply) {
        self.routes.lock().defaults.insert(path.to_string(), reply);
    }

    /// Ajoute une réponse à consommer une seule fois, dans l'ordre
    pub fn push_reply(&self, path: &str, reply: MockReply) {
        self.routes
            .lock()
            .scripted
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn requests(&self, path: &str) -> Vec<RecordedRequest> {
        self.routes
            .lock()
            .requests
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.routes.lock().requests.iter().filter(|r| r.path == path).count()
    }

    /// Arrête le serveur (les connexions suivantes échouent)
    pub fn shutdown(&self) {
        if let Some(tx) = self.shutdown.lock().take() {
            let _ = tx.send(());
        }
    }
}

async fn handle(
    State(routes): State<SharedRoutes>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let reply = {
        let mut routes = routes.lock();
        routes.requests.push(RecordedRequest {
            method,
            path: path.clone(),
            content_type: headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: body.to_vec(),
        });
        routes.next_reply(&path)
    };

    let Some(reply) = reply else {
        return (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"error":"no mock reply"}"#,
        )
            .into_response();
    };

    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], reply.body).into_response()
}
