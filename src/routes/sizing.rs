use actix_web::{http::header, web, HttpRequest, HttpResponse};
use uuid::Uuid;
use validator::Validate;
use crate::models::{
    CreateSizeRuleRequest, DistributionResponse, ErrorResponse, HealthResponse, Identity,
    NewSizeRule, RecordsResponse, ResolveSizeRequest, ResolveSizeResponse,
    SaveMeasurementsRequest, SlotsResponse,
};
use crate::services::export::{identity_label, render_csv};
use crate::services::{SizingError, SizingService, TokenVerifier};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: SizingService,
    pub verifier: TokenVerifier,
}

impl AppState {
    /// Identity of the caller, if the request carries a valid token
    fn identity(&self, req: &HttpRequest) -> Option<Identity> {
        let header = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())?;

        match self.verifier.verify_header(Some(header)) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::info!("Rejected credentials on {}: {}", req.path(), e);
                None
            }
        }
    }
}

/// Configure all sizing routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/garments", web::get().to(company_garments))
        .route("/garments/{garment_id}/slots", web::get().to(garment_slots))
        .route("/garments/{garment_id}/rules", web::get().to(garment_rules))
        .route("/garments/{garment_id}/rules", web::post().to(add_rule))
        .route("/garments/{garment_id}/rules/{rule_id}", web::delete().to(remove_rule))
        .route("/sizes/resolve", web::post().to(resolve_size))
        .route("/measurements", web::get().to(list_measurements))
        .route("/measurements", web::post().to(save_measurements))
        .route("/measurements/{record_id}", web::delete().to(delete_measurement))
        .route("/company/sizes", web::get().to(company_sizes))
        .route("/company/sizes/export", web::get().to(export_company_sizes));
}

fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let healthy = state.service.health_check().await;
    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Garments assigned to the caller's company
///
/// GET /api/v1/garments
async fn company_garments(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, SizingError> {
    let identity = state.identity(&req);
    let garments = state.service.company_garments(identity.as_ref()).await?;
    Ok(HttpResponse::Ok().json(garments))
}

/// Measurement form of a garment
///
/// GET /api/v1/garments/{garmentId}/slots
async fn garment_slots(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, SizingError> {
    let garment_id = path.into_inner();
    let layout = state.service.slots(garment_id).await?;

    Ok(HttpResponse::Ok().json(SlotsResponse {
        garment_id,
        fallback: layout.is_fallback(),
        slots: layout.slots(),
    }))
}

/// Size rules of a garment in stored order
///
/// GET /api/v1/garments/{garmentId}/rules
async fn garment_rules(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, SizingError> {
    let rules = state.service.rules(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(rules))
}

/// Append a size rule
///
/// POST /api/v1/garments/{garmentId}/rules
///
/// Request body:
/// ```json
/// {
///   "measureKey": "chest",
///   "label": "M",
///   "minValue": 97,
///   "maxValue": 104,
///   "priority": 5
/// }
/// ```
async fn add_rule(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<CreateSizeRuleRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, SizingError> {
    let identity = state
        .identity(&req)
        .ok_or_else(|| SizingError::Auth("no authenticated user".to_string()))?;
    if let Err(errors) = body.validate() {
        return Ok(validation_failed(errors));
    }

    let body = body.into_inner();
    let rule = NewSizeRule {
        garment_id: path.into_inner(),
        measure_key: body.measure_key,
        label: body.label,
        min_value: body.min_value,
        max_value: body.max_value,
        priority: body.priority,
    };

    let created = state.service.add_rule(Some(&identity), rule).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Remove a size rule
///
/// DELETE /api/v1/garments/{garmentId}/rules/{ruleId}
async fn remove_rule(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    req: HttpRequest,
) -> Result<HttpResponse, SizingError> {
    let (garment_id, rule_id) = path.into_inner();
    let identity = state.identity(&req);
    state
        .service
        .remove_rule(identity.as_ref(), garment_id, rule_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Resolve a size for the current form values
///
/// POST /api/v1/sizes/resolve
///
/// Request body:
/// ```json
/// {
///   "garmentId": "uuid",
///   "measurements": { "chest": "98", "waist": "84.5" }
/// }
/// ```
async fn resolve_size(
    state: web::Data<AppState>,
    body: web::Json<ResolveSizeRequest>,
) -> Result<HttpResponse, SizingError> {
    if let Err(errors) = body.validate() {
        return Ok(validation_failed(errors));
    }

    let resolution = state
        .service
        .resolve(body.garment_id, &body.measurements)
        .await?;

    Ok(HttpResponse::Ok().json(ResolveSizeResponse {
        garment_id: body.garment_id,
        size_label: resolution.label,
        source: resolution.source,
    }))
}

/// Save the caller's measurements
///
/// POST /api/v1/measurements
async fn save_measurements(
    state: web::Data<AppState>,
    body: web::Json<SaveMeasurementsRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, SizingError> {
    let identity = state.identity(&req);
    if identity.is_none() {
        return Err(SizingError::Auth("no authenticated user".to_string()));
    }
    if let Err(errors) = body.validate() {
        return Ok(validation_failed(errors));
    }

    let record = state
        .service
        .save(identity.as_ref(), body.garment_id, &body.measurements)
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Current records of the caller
///
/// GET /api/v1/measurements
async fn list_measurements(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, SizingError> {
    let identity = state.identity(&req);
    let records = state.service.list(identity.as_ref()).await?;

    Ok(HttpResponse::Ok().json(RecordsResponse {
        count: records.len(),
        records,
    }))
}

/// Delete one of the caller's records
///
/// DELETE /api/v1/measurements/{recordId}
async fn delete_measurement(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<HttpResponse, SizingError> {
    let identity = state.identity(&req);
    state
        .service
        .delete(identity.as_ref(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Size distribution of the caller's company
///
/// GET /api/v1/company/sizes
async fn company_sizes(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, SizingError> {
    let identity = state
        .identity(&req)
        .ok_or_else(|| SizingError::Auth("no authenticated user".to_string()))?;
    let rows = state.service.aggregate(identity.company_id).await?;

    Ok(HttpResponse::Ok().json(DistributionResponse {
        company_id: identity.company_id,
        rows,
    }))
}

/// Size distribution of the caller's company as CSV
///
/// GET /api/v1/company/sizes/export
async fn export_company_sizes(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, SizingError> {
    let identity = state
        .identity(&req)
        .ok_or_else(|| SizingError::Auth("no authenticated user".to_string()))?;
    let rows = state.service.aggregate(identity.company_id).await?;

    match render_csv(&rows, identity_label) {
        Ok(body) => Ok(HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"sizes.csv\"",
            ))
            .body(body)),
        Err(e) => {
            tracing::error!("Failed to render export for {}: {}", identity.company_id, e);
            Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to render export".to_string(),
                message: e.to_string(),
                status_code: 500,
            }))
        }
    }
}
