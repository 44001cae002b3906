//! Principal extraction.
//!
//! Credential verification happens upstream: the authenticating gateway
//! attaches identity headers to every proxied request, and this extractor
//! turns them into a [`Principal`] before any handler logic runs. Requests
//! with absent or malformed identity are rejected with 401.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Json;
use referral_core::{Principal, Role};
use uuid::Uuid;

use crate::wire::ErrorBody;

pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
pub const PRINCIPAL_ROLE_HEADER: &str = "x-principal-role";
pub const PRINCIPAL_DEPARTMENT_HEADER: &str = "x-principal-department";

/// A verified principal extracted from the gateway identity headers.
pub struct AuthenticatedPrincipal(pub Principal);

type Rejection = (StatusCode, Json<ErrorBody>);

fn unauthenticated(message: &str) -> Rejection {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody::new("unauthenticated", message)),
    )
}

fn required_header(parts: &Parts, name: &'static str) -> Result<String, Rejection> {
    let value = parts
        .headers
        .get(name)
        .ok_or_else(|| unauthenticated(&format!("missing {name} header")))?;
    let value = value
        .to_str()
        .map_err(|_| unauthenticated(&format!("malformed {name} header")))?;
    if value.trim().is_empty() {
        return Err(unauthenticated(&format!("missing {name} header")));
    }
    Ok(value.trim().to_owned())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedPrincipal
where
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = required_header(parts, PRINCIPAL_ID_HEADER)?;
        let role = required_header(parts, PRINCIPAL_ROLE_HEADER)?
            .parse::<Role>()
            .map_err(|_| unauthenticated("unrecognised principal role"))?;

        let department = match parts.headers.get(PRINCIPAL_DEPARTMENT_HEADER) {
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| unauthenticated("malformed department header"))?;
                Some(
                    Uuid::parse_str(value.trim())
                        .map_err(|_| unauthenticated("malformed department header"))?,
                )
            }
            None => None,
        };

        if role != Role::Admin && department.is_none() {
            return Err(unauthenticated(
                "a department affiliation is required for this role",
            ));
        }

        Ok(AuthenticatedPrincipal(Principal {
            id,
            role,
            department,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Principal, Rejection> {
        let (mut parts, _) = request.into_parts();
        AuthenticatedPrincipal::from_request_parts(&mut parts, &())
            .await
            .map(|p| p.0)
    }

    #[tokio::test]
    async fn accepts_a_full_identity() {
        let department = Uuid::new_v4();
        let request = Request::builder()
            .header(PRINCIPAL_ID_HEADER, "u-42")
            .header(PRINCIPAL_ROLE_HEADER, "PHYSICIAN")
            .header(PRINCIPAL_DEPARTMENT_HEADER, department.to_string())
            .body(())
            .expect("request");

        let principal = extract(request).await.expect("valid identity");
        assert_eq!(principal.id, "u-42");
        assert_eq!(principal.role, Role::Physician);
        assert_eq!(principal.department, Some(department));
    }

    #[tokio::test]
    async fn admin_needs_no_department() {
        let request = Request::builder()
            .header(PRINCIPAL_ID_HEADER, "root")
            .header(PRINCIPAL_ROLE_HEADER, "ADMIN")
            .body(())
            .expect("request");

        let principal = extract(request).await.expect("valid identity");
        assert_eq!(principal.role, Role::Admin);
        assert_eq!(principal.department, None);
    }

    #[tokio::test]
    async fn rejects_missing_identity() {
        let request = Request::builder().body(()).expect("request");
        let (status, _) = extract(request).await.expect_err("no headers");
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_unknown_roles() {
        let request = Request::builder()
            .header(PRINCIPAL_ID_HEADER, "u-42")
            .header(PRINCIPAL_ROLE_HEADER, "SUPERUSER")
            .body(())
            .expect("request");

        let (status, _) = extract(request).await.expect_err("unknown role");
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_non_admin_without_department() {
        let request = Request::builder()
            .header(PRINCIPAL_ID_HEADER, "u-42")
            .header(PRINCIPAL_ROLE_HEADER, "DEPARTMENT_HEAD")
            .body(())
            .expect("request");

        let (status, _) = extract(request).await.expect_err("missing affiliation");
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
