//! HTTP handler functions for the civic issue API.

use actix_web::{HttpRequest, HttpResponse, web};
use aura_ai::AiError;
use aura_report_models::{IssueCategory, ReportStatus};
use aura_server_models::{
    AnalyzeRequest, AnalyzeResponse, ApiCategoryNode, ApiError, ApiHealth, ApiReport,
    ApiStatusCounts, FeedbackRequest, ReportQueryParams, UpdateStatusRequest,
};
use aura_store::{ReportQuery, StoreError};
use chrono::Utc;
use std::sync::PoisonError;

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/categories`
///
/// Returns the issue taxonomy with default priorities.
pub async fn categories() -> HttpResponse {
    let nodes: Vec<ApiCategoryNode> = IssueCategory::all()
        .iter()
        .map(|category| ApiCategoryNode::from(*category))
        .collect();

    HttpResponse::Ok().json(nodes)
}

/// `GET /api/reports`
///
/// Lists reports with status, priority, ordering, and limit filters.
pub async fn reports(
    state: web::Data<AppState>,
    params: web::Query<ReportQueryParams>,
) -> HttpResponse {
    let query = ReportQuery::from(&*params);
    match state.store.list_reports(&query).await {
        Ok(rows) => {
            let api_reports: Vec<ApiReport> = rows.into_iter().map(ApiReport::from).collect();
            HttpResponse::Ok().json(api_reports)
        }
        Err(e) => {
            log::error!("Failed to list reports: {e}");
            HttpResponse::InternalServerError().json(ApiError {
                error: "Failed to list reports".to_string(),
            })
        }
    }
}

/// `GET /api/reports/counts`
///
/// Returns status counts for the dashboard header. Duplicates count
/// toward `total` only.
pub async fn report_counts(state: web::Data<AppState>) -> HttpResponse {
    match state.store.list_reports(&ReportQuery::default()).await {
        Ok(rows) => {
            let mut counts = ApiStatusCounts {
                pending: 0,
                progress: 0,
                resolved: 0,
                all: 0,
                total: rows.len(),
            };
            for report in &rows {
                match report.status {
                    ReportStatus::Pending => counts.pending += 1,
                    ReportStatus::InProgress => counts.progress += 1,
                    ReportStatus::Resolved => counts.resolved += 1,
                    ReportStatus::Duplicate => {}
                }
            }
            counts.all = counts.pending + counts.progress + counts.resolved;
            HttpResponse::Ok().json(counts)
        }
        Err(e) => {
            log::error!("Failed to count reports: {e}");
            HttpResponse::InternalServerError().json(ApiError {
                error: "Failed to count reports".to_string(),
            })
        }
    }
}

/// `POST /api/reports/{id}/status`
///
/// Applies a status transition through the store, setting or clearing
/// `resolved_at` according to the lifecycle invariant.
pub async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    match state
        .store
        .update_status(&id, body.status, Utc::now())
        .await
    {
        Ok(report) => HttpResponse::Ok().json(ApiReport::from(report)),
        Err(e) => store_error_response(&e, "update report status"),
    }
}

/// `POST /api/reports/{id}/feedback`
///
/// Records citizen verification on a resolved report.
pub async fn submit_feedback(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<FeedbackRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    let FeedbackRequest { verified, feedback } = body.into_inner();
    match state.store.submit_feedback(&id, verified, feedback).await {
        Ok(report) => HttpResponse::Ok().json(ApiReport::from(report)),
        Err(e) => store_error_response(&e, "record feedback"),
    }
}

/// `POST /api/analyze`
///
/// Classifies a report photo. Rate limited per caller; anonymous callers
/// (identified by IP) get a stricter budget than authenticated ones.
pub async fn analyze(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<AnalyzeRequest>,
) -> HttpResponse {
    let identifier = client_identifier(&req);
    let allowed = state
        .rate_limiter
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .check(&identifier);
    if !allowed {
        log::warn!("rate limit exceeded for {identifier}");
        return HttpResponse::TooManyRequests().json(ApiError {
            error: "Too many requests. Please try again later.".to_string(),
        });
    }

    if body.image_base64.is_empty() {
        return HttpResponse::BadRequest().json(ApiError {
            error: "Image data is required".to_string(),
        });
    }
    if aura_ai::estimated_image_bytes(body.image_base64.len()) > aura_ai::MAX_IMAGE_BYTES {
        return HttpResponse::PayloadTooLarge().json(ApiError {
            error: "Image too large. Maximum size is 10MB.".to_string(),
        });
    }

    let Some(classifier) = state.classifier.as_ref() else {
        return HttpResponse::ServiceUnavailable().json(ApiError {
            error: "Image analysis is not configured".to_string(),
        });
    };

    match aura_ai::classify_image(classifier.as_ref(), &body.image_base64).await {
        Ok(classification) => HttpResponse::Ok().json(AnalyzeResponse::from(classification)),
        Err(AiError::RateLimited) => HttpResponse::TooManyRequests().json(ApiError {
            error: "Rate limit exceeded. Please try again later.".to_string(),
        }),
        Err(AiError::CreditsExhausted) => HttpResponse::PaymentRequired().json(ApiError {
            error: "AI credits exhausted. Please add credits to continue.".to_string(),
        }),
        Err(e) => {
            // Details stay in the server log; clients get a generic message.
            log::error!("Failed to analyze image: {e}");
            HttpResponse::InternalServerError().json(ApiError {
                error: "Unable to analyze image at this time. Please try again later.".to_string(),
            })
        }
    }
}

/// Maps a [`StoreError`] to an HTTP response with a client-safe message.
fn store_error_response(error: &StoreError, action: &str) -> HttpResponse {
    match error {
        StoreError::NotFound { id } => {
            log::warn!("failed to {action}: report not found: {id}");
            HttpResponse::NotFound().json(ApiError {
                error: "Report not found".to_string(),
            })
        }
        StoreError::Transition(e) => {
            log::warn!("failed to {action}: {e}");
            HttpResponse::Conflict().json(ApiError {
                error: e.to_string(),
            })
        }
        StoreError::InvalidFeedback(e) => {
            log::warn!("failed to {action}: {e}");
            HttpResponse::Conflict().json(ApiError {
                error: e.to_string(),
            })
        }
        StoreError::Unavailable { message } => {
            log::error!("failed to {action}: store unavailable: {message}");
            HttpResponse::ServiceUnavailable().json(ApiError {
                error: "Report store is unavailable".to_string(),
            })
        }
    }
}

/// Rate-limit identifier for the caller: the bearer token when one is
/// presented, otherwise the client IP with an `ip:` prefix (which carries
/// the stricter anonymous budget).
fn client_identifier(req: &HttpRequest) -> String {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return token.to_string();
    }

    let ip = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string());
    format!("ip:{ip}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};
    use aura_report_models::Report;
    use aura_store::MemoryReportStore;
    use chrono::TimeZone as _;
    use std::sync::Arc;

    fn seeded_state() -> web::Data<AppState> {
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let store = MemoryReportStore::with_reports(vec![
            Report::new("r-1", IssueCategory::OpenManhole, 18.52, 73.85, created),
            Report::new("r-2", IssueCategory::SweepingNotDone, 18.53, 73.86, created),
        ]);
        web::Data::new(AppState::new(Arc::new(store), None))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state.clone())
                    .app_data(crate::json_config())
                    .service(crate::api_scope()),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_reports_healthy() {
        let app = app!(seeded_state());
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
    }

    #[actix_web::test]
    async fn categories_cover_the_taxonomy() {
        let app = app!(seeded_state());
        let req = test::TestRequest::get().uri("/api/categories").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let nodes = body.as_array().unwrap();
        assert_eq!(nodes.len(), IssueCategory::all().len());
        assert_eq!(nodes[3]["name"], "open_manhole");
        assert_eq!(nodes[3]["priority"], "high");
        assert_eq!(nodes[3]["priorityValue"], 3);
    }

    #[actix_web::test]
    async fn reports_filter_by_min_priority() {
        let app = app!(seeded_state());
        let req = test::TestRequest::get()
            .uri("/api/reports?minPriority=high")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "r-1");
    }

    #[actix_web::test]
    async fn counts_track_status_changes() {
        let state = seeded_state();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/reports/r-1/status")
            .set_json(UpdateStatusRequest {
                status: ReportStatus::InProgress,
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let req = test::TestRequest::get()
            .uri("/api/reports/counts")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["pending"], 1);
        assert_eq!(body["progress"], 1);
        assert_eq!(body["resolved"], 0);
        assert_eq!(body["all"], 2);
    }

    #[actix_web::test]
    async fn invalid_transition_is_conflict() {
        let app = app!(seeded_state());
        let req = test::TestRequest::post()
            .uri("/api/reports/r-1/status")
            .set_json(UpdateStatusRequest {
                status: ReportStatus::Pending,
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 409);
    }

    #[actix_web::test]
    async fn unknown_report_is_not_found() {
        let app = app!(seeded_state());
        let req = test::TestRequest::post()
            .uri("/api/reports/r-404/status")
            .set_json(UpdateStatusRequest {
                status: ReportStatus::InProgress,
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn feedback_requires_resolution() {
        let app = app!(seeded_state());
        let req = test::TestRequest::post()
            .uri("/api/reports/r-1/feedback")
            .set_json(FeedbackRequest {
                verified: true,
                feedback: None,
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 409);
    }

    #[actix_web::test]
    async fn anonymous_analyze_is_rate_limited_after_two_requests() {
        let app = app!(seeded_state());
        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/api/analyze")
                .insert_header(("x-forwarded-for", "203.0.113.9"))
                .set_json(AnalyzeRequest {
                    image_base64: String::new(),
                })
                .to_request();
            let resp = test::call_service(&app, req).await;
            // Empty payload, but it still consumes rate-limit budget.
            assert_eq!(resp.status(), 400);
        }

        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .insert_header(("x-forwarded-for", "203.0.113.9"))
            .set_json(AnalyzeRequest {
                image_base64: String::new(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 429);
    }

    #[actix_web::test]
    async fn oversized_image_is_rejected() {
        let app = app!(seeded_state());
        let oversized = "A".repeat(aura_ai::MAX_IMAGE_BYTES * 4 / 3 + 4);
        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .insert_header(("Authorization", "Bearer user-42"))
            .set_json(AnalyzeRequest {
                image_base64: oversized,
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 413);
    }

    #[actix_web::test]
    async fn analyze_without_classifier_is_unavailable() {
        let app = app!(seeded_state());
        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .insert_header(("Authorization", "Bearer user-42"))
            .set_json(AnalyzeRequest {
                image_base64: "aGVsbG8=".to_string(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 503);
    }
}
