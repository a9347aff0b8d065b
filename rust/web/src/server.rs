use crate::auth::Authenticator;
use crate::handlers;
use crate::score::MemoryScoreStore;
use crate::session::SessionManager;
use std::convert::Infallible;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;
use warp::filters::BoxedFilter;
use warp::reply::Reply;
use warp::Filter;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    host: String,
    port: u16,
    token_secret: String,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16, token_secret: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            token_secret: token_secret.into(),
        }
    }

    pub fn for_tests() -> Self {
        Self::new("127.0.0.1", 0, "test-secret")
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn token_secret(&self) -> &str {
        &self.token_secret
    }
}

#[derive(Debug, Clone)]
pub struct AppContext {
    config: ServerConfig,
    sessions: Arc<SessionManager>,
    authenticator: Arc<Authenticator>,
}

impl AppContext {
    pub fn new(config: ServerConfig) -> Self {
        let store = Arc::new(MemoryScoreStore::new());
        let sessions = Arc::new(SessionManager::new(store));
        let authenticator = Arc::new(Authenticator::new(config.token_secret().as_bytes()));
        Self::new_with_dependencies(config, sessions, authenticator)
    }

    pub fn new_with_dependencies(
        config: ServerConfig,
        sessions: Arc<SessionManager>,
        authenticator: Arc<Authenticator>,
    ) -> Self {
        Self {
            config,
            sessions,
            authenticator,
        }
    }

    pub fn new_for_tests() -> Self {
        Self::new(ServerConfig::for_tests())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn sessions(&self) -> Arc<SessionManager> {
        Arc::clone(&self.sessions)
    }

    pub fn authenticator(&self) -> Arc<Authenticator> {
        Arc::clone(&self.authenticator)
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[derive(Debug, Clone)]
pub struct WebServer {
    context: AppContext,
}

impl WebServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            context: AppContext::new(config),
        }
    }

    pub fn from_context(context: AppContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let WebServer { context } = self;
        let config = context.config().clone();
        let bind_addr = Self::bind_addr(&config)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let routes = Self::routes(&context);
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };

        let (addr, server_future) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(bind_addr, shutdown_signal)
            .map_err(Self::map_warp_error)?;

        info!(%addr, "web server listening");

        let task = tokio::spawn(async move {
            server_future.await;
            Ok(())
        });

        Ok(ServerHandle::new(addr, shutdown_tx, task, context))
    }

    fn bind_addr(config: &ServerConfig) -> Result<SocketAddr, ServerError> {
        let host = config.host();

        if let Ok(addr) = host.parse::<SocketAddr>() {
            return Ok(addr);
        }

        if let Ok(ip) = host.parse::<std::net::IpAddr>() {
            return Ok(SocketAddr::new(ip, config.port()));
        }

        let candidate = format!("{}:{}", host, config.port());
        let mut addrs = candidate.to_socket_addrs().map_err(|err| {
            ServerError::ConfigError(format!("failed to resolve address `{candidate}`: {err}"))
        })?;

        addrs.next().ok_or_else(|| {
            ServerError::ConfigError(format!("failed to resolve address `{candidate}`"))
        })
    }

    fn map_warp_error(err: warp::Error) -> ServerError {
        use std::error::Error as StdError;

        if let Some(source) = err.source() {
            if let Some(io_err) = source.downcast_ref::<std::io::Error>() {
                let recreated = std::io::Error::new(io_err.kind(), io_err.to_string());
                return ServerError::BindError(recreated);
            }
        }

        ServerError::ConfigError(err.to_string())
    }

    fn routes(context: &AppContext) -> BoxedFilter<(warp::reply::Response,)> {
        let health = Self::health_route();
        let session_routes = Self::session_routes(context);

        health
            .or(session_routes)
            .unify()
            .with(warp::log::custom(|log_info: warp::log::Info| {
                info!(
                    method = %log_info.method(),
                    path = log_info.path(),
                    status = log_info.status().as_u16(),
                    elapsed_ms = log_info.elapsed().as_millis() as u64,
                    "request"
                );
            }))
            .map(|logged| Reply::into_response(logged))
            .boxed()
    }

    fn health_route() -> BoxedFilter<(warp::reply::Response,)> {
        warp::path("health")
            .and(warp::get())
            .and(warp::path::end())
            .map(|| handlers::health::health().into_response())
            .boxed()
    }

    fn session_routes(context: &AppContext) -> BoxedFilter<(warp::reply::Response,)> {
        let sessions = context.sessions();
        let authenticator = context.authenticator();

        let start = warp::path("session")
            .and(warp::path::end())
            .and(warp::get())
            .and(Self::with_session_manager(sessions.clone()))
            .and(warp::query::<handlers::StartQuery>())
            .and_then(
                |sessions: Arc<SessionManager>, query: handlers::StartQuery| async move {
                    let response = handlers::start_session(sessions, query).await;
                    Ok::<_, Infallible>(response)
                },
            );

        let action = warp::path("session")
            .and(warp::path::end())
            .and(warp::post())
            .and(Self::with_session_manager(sessions))
            .and(Self::with_authenticator(authenticator))
            .and(warp::header::optional::<String>("authorization"))
            .and(warp::body::json())
            .and_then(
                |sessions: Arc<SessionManager>,
                 auth: Arc<Authenticator>,
                 authorization: Option<String>,
                 request: handlers::SessionActionRequest| async move {
                    let response =
                        handlers::session_action(sessions, auth, authorization, request).await;
                    Ok::<_, Infallible>(response)
                },
            );

        start.or(action).unify().boxed()
    }

    fn with_session_manager(
        sessions: Arc<SessionManager>,
    ) -> impl Filter<Extract = (Arc<SessionManager>,), Error = Infallible> + Clone {
        warp::any().map(move || Arc::clone(&sessions))
    }

    fn with_authenticator(
        authenticator: Arc<Authenticator>,
    ) -> impl Filter<Extract = (Arc<Authenticator>,), Error = Infallible> + Clone {
        warp::any().map(move || Arc::clone(&authenticator))
    }
}

#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
    context: AppContext,
}

impl ServerHandle {
    fn new(
        addr: SocketAddr,
        shutdown: oneshot::Sender<()>,
        task: JoinHandle<Result<(), ServerError>>,
        context: AppContext,
    ) -> Self {
        Self {
            addr,
            shutdown: Some(shutdown),
            task: Some(task),
            context,
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            match task.await {
                Ok(result) => result?,
                Err(err) => {
                    return Err(ServerError::ConfigError(format!(
                        "server task join error: {err}"
                    )))
                }
            }
        }

        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
