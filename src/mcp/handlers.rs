//! MCP HTTP handlers for Actix-Web.
//!
//! Two flavours share one [`McpService`]:
//! - `POST /mcp` answers inline, as JSON or as a single SSE event.
//! - `GET /sse` + `POST /messages` is the legacy SSE transport: the stream
//!   announces a per-session endpoint and replies are pushed onto it.

use std::collections::HashMap;

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::mcp::rpc::{self, OutboundResponse, INTERNAL_ERROR};
use crate::mcp::service::McpService;

const SESSION_BUFFER: usize = 32;

/// MCP State for Actix-Web
pub struct McpState {
    pub service: McpService,
    sessions: Mutex<HashMap<String, mpsc::Sender<OutboundResponse>>>,
}

impl McpState {
    pub fn new(service: McpService) -> Self {
        Self {
            service,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}

/// Removes an SSE session once its stream is dropped.
struct SessionGuard {
    state: web::Data<McpState>,
    session_id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.state.sessions.lock().remove(&self.session_id);
        log::info!("SSE session {} closed", self.session_id);
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    session_id: String,
}

/// RPC handler - POST /mcp
pub async fn rpc_handler(
    state: web::Data<McpState>,
    req: HttpRequest,
    body: web::Bytes,
) -> impl Responder {
    let response = match rpc::decode(&body) {
        Ok(request) => {
            log::debug!("received MCP request: {}", request.method);
            match state.service.handle_request(request).await {
                Some(response) => response,
                // Notifications return 202 Accepted
                None => return HttpResponse::Accepted().finish(),
            }
        }
        Err(response) => response,
    };

    if wants_event_stream(&req) {
        return HttpResponse::Ok()
            .content_type("text/event-stream")
            .insert_header((header::CACHE_CONTROL, "no-cache"))
            .body(sse_event("message", &encode(&response)));
    }

    HttpResponse::Ok().json(response)
}

/// SSE handler - GET /sse
pub async fn sse_handler(state: web::Data<McpState>) -> impl Responder {
    let session_id = Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::channel(SESSION_BUFFER);
    state.sessions.lock().insert(session_id.clone(), tx);
    log::info!("SSE session {} opened", session_id);

    let endpoint = sse_event("endpoint", &format!("/messages?session_id={session_id}"));
    let guard = SessionGuard {
        state: state.clone(),
        session_id,
    };

    let messages = ReceiverStream::new(rx).map(move |response: OutboundResponse| {
        let _guard = &guard;
        Ok::<_, actix_web::Error>(web::Bytes::from(sse_event("message", &encode(&response))))
    });
    let events = stream::once(async move { Ok(web::Bytes::from(endpoint)) }).chain(messages);

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(events)
}

/// Message handler - POST /messages?session_id=...
///
/// Acknowledges immediately; the reply travels over the session's stream.
pub async fn messages_handler(
    state: web::Data<McpState>,
    query: web::Query<SessionQuery>,
    body: web::Bytes,
) -> impl Responder {
    let Some(tx) = state.sessions.lock().get(&query.session_id).cloned() else {
        return HttpResponse::NotFound().json(json!({
            "error": "NotFound",
            "message": format!("Unknown SSE session '{}'", query.session_id),
        }));
    };

    let service = state.service.clone();
    actix_web::rt::spawn(async move {
        let response = match rpc::decode(&body) {
            Ok(request) => service.handle_request(request).await,
            Err(response) => Some(response),
        };
        if let Some(response) = response {
            if tx.send(response).await.is_err() {
                log::warn!("SSE session closed before its response was delivered");
            }
        }
    });

    HttpResponse::Accepted().finish()
}

/// Health check - GET /health
pub async fn health(state: web::Data<McpState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "tools": state.service.registry().list_tools().len(),
        "sse_sessions": state.session_count(),
    }))
}

/// Configure MCP routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/mcp").route(web::post().to(rpc_handler)))
        .service(web::resource("/sse").route(web::get().to(sse_handler)))
        .service(web::resource("/messages").route(web::post().to(messages_handler)))
        .service(web::resource("/health").route(web::get().to(health)));
}

/// True when the client accepts only an event stream.
fn wants_event_stream(req: &HttpRequest) -> bool {
    let accept = req
        .headers()
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    accept.contains("text/event-stream")
        && !accept.contains("application/json")
        && !accept.contains("*/*")
}

fn sse_event(event: &str, data: &str) -> String {
    format!("event: {event}\ndata: {data}\n\n")
}

fn encode(response: &OutboundResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|err| {
        json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": { "code": INTERNAL_ERROR, "message": err.to_string() }
        })
        .to_string()
    })
}
