//! Local development server. Every request is converted into an API Gateway
//! HTTP API event and routed through the same handler as the Lambda.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use portfolio::api::handle_request;
use portfolio::core::config::AppConfig;
use portfolio::state::AppState;
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    portfolio::setup_logging();

    let config = AppConfig::from_env().map_err(anyhow::Error::msg)?;
    let address = format!("0.0.0.0:{}", config.port);
    let state = AppState::initialize(config).await;

    let app = Router::new().fallback(proxy).with_state(state);

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shut down");
    Ok(())
}

async fn proxy(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = to_event(&method, &uri, &headers, &body, peer);
    let response = handle_request(&state, &event).await;
    into_axum_response(&response)
}

fn to_event(method: &Method, uri: &Uri, headers: &HeaderMap, body: &Bytes, peer: SocketAddr) -> Value {
    let header_map: Map<String, Value> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), Value::String(v.to_string())))
        })
        .collect();

    json!({
        "version": "2.0",
        "rawPath": uri.path(),
        "rawQueryString": uri.query().unwrap_or(""),
        "headers": header_map,
        "requestContext": {
            "http": {
                "method": method.as_str(),
                "path": uri.path(),
                "sourceIp": peer.ip().to_string()
            }
        },
        "body": String::from_utf8_lossy(body),
        "isBase64Encoded": false
    })
}

fn into_axum_response(proxy: &Value) -> Response {
    let status = proxy
        .get("statusCode")
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = proxy
        .get("body")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut response = (status, Body::from(body)).into_response();
    if let Some(headers) = proxy.get("headers").and_then(Value::as_object) {
        for (name, value) in headers {
            let (Ok(name), Some(Ok(value))) = (
                HeaderName::from_bytes(name.as_bytes()),
                value.as_str().map(HeaderValue::from_str),
            ) else {
                warn!(header = %name, "Dropping invalid response header");
                continue;
            };
            response.headers_mut().insert(name, value);
        }
    }
    response
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
