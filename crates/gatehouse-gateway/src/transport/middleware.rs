//! Axum seam for the admission controller.
//!
//! Responsibilities:
//! - Build the `RequestDescriptor` once from the live request
//! - Run admission before any handler
//! - On reject, answer `{error, message}` JSON and stop the pipeline

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use gatehouse_core::{CallerRole, RequestDescriptor};

use crate::admission::{AdmissionOutcome, Rejection};
use crate::app_state::AppState;

/// Role claim attached to the request by upstream authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleClaim(pub String);

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.error,
                "message": self.message,
            })),
        )
            .into_response()
    }
}

/// Last hop of `X-Forwarded-For`, if it parses.
///
/// Proxies append the address they saw, so only the rightmost entry comes
/// from the trusted proxy. Anything left of it is client-supplied.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .rsplit(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

pub fn describe(req: &Request, trust_proxy: bool) -> RequestDescriptor {
    let headers = req.headers();

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let ip = trust_proxy
        .then(|| forwarded_ip(headers))
        .flatten()
        .or(peer)
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    // The query string stays attached so the shield sees it too.
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.uri().path());

    let descriptor = RequestDescriptor::new(ip, user_agent, req.method().as_str(), target);
    match req.extensions().get::<RoleClaim>() {
        Some(RoleClaim(claim)) => descriptor.with_role(CallerRole::from_claim(Some(claim))),
        None => descriptor,
    }
}

pub async fn admission_guard(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let descriptor = describe(&req, app.cfg().gateway.trust_proxy);
    match app.admission().admit(&descriptor).await {
        AdmissionOutcome::Proceed => next.run(req).await,
        AdmissionOutcome::Reject(rejection) => rejection.into_response(),
    }
}
