use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use mentora_core::models::requester::{Requester, Role};

/// Authentication middleware.
///
/// Extracts the `Authorization: Bearer <token>` header plus the role claim
/// and inserts a [`Requester`] into request extensions for handlers to use.
///
/// Full JWT validation against the identity provider will be wired up when
/// the decoding key is added to AppState. For now the subject claim is
/// carried as the bearer token and the role in `x-mentora-role`.
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let requester = {
        let auth_header = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        // TODO: validate the JWT and read sub/role from its claims instead
        let id: Uuid = token.parse().map_err(|_| StatusCode::UNAUTHORIZED)?;
        let role: Role = req
            .headers()
            .get("x-mentora-role")
            .and_then(|v| v.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?
            .parse()
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        Requester { id, role }
    };

    req.extensions_mut().insert(requester);

    Ok(next.run(req).await)
}
