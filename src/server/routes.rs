use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use futures_util::TryStreamExt as _;
use log::{error, info, warn};

use super::types::{
    ApiResponse, BatchPredictionItem, BatchPredictionRequest, BatchPredictionResponse,
    HealthResponse, PredictionRequest, ServiceInfo, UploadAccepted,
};
use crate::forward::process_sheet;
use crate::scorer::{CriticalityScores, Scorer, ScorerError};
use crate::settings::Settings;
use crate::sheet::{self, SheetError};

const SERVICE_NAME: &str = "Anomaly Criticality Scoring API";
const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn root(scorer: web::Data<Arc<Scorer>>) -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success(ServiceInfo {
        message: SERVICE_NAME.to_string(),
        status: "running".to_string(),
        version: VERSION.to_string(),
        model_loaded: !scorer.model_path.is_empty(),
    }))
}

pub async fn health(scorer: web::Data<Arc<Scorer>>) -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: !scorer.model_path.is_empty(),
        tokenizer_loaded: !scorer.tokenizer_path.is_empty(),
    }))
}

pub async fn predict(
    scorer: web::Data<Arc<Scorer>>,
    req: web::Json<PredictionRequest>,
) -> impl Responder {
    let start = Instant::now();

    if req.text.trim().is_empty() {
        return HttpResponse::BadRequest().json(
            ApiResponse::<CriticalityScores>::error("Text cannot be empty")
                .with_timing(start.elapsed().as_millis() as u64),
        );
    }

    let scorer = scorer.get_ref().clone();
    let text = req.scoring_text();

    match web::block(move || scorer.predict(&text)).await {
        Ok(Ok(scores)) => {
            info!("Scored request: criticite={}", scores.criticite);
            HttpResponse::Ok().json(
                ApiResponse::success(scores).with_timing(start.elapsed().as_millis() as u64),
            )
        }
        Ok(Err(ScorerError::ValidationError(msg))) => HttpResponse::BadRequest().json(
            ApiResponse::<CriticalityScores>::error(&msg)
                .with_timing(start.elapsed().as_millis() as u64),
        ),
        Ok(Err(e)) => {
            error!("Prediction failed: {}", e);
            HttpResponse::InternalServerError().json(
                ApiResponse::<CriticalityScores>::error("Internal server error")
                    .with_timing(start.elapsed().as_millis() as u64),
            )
        }
        Err(e) => {
            error!("Blocking execution failed: {}", e);
            HttpResponse::InternalServerError().json(
                ApiResponse::<CriticalityScores>::error("Internal server error")
                    .with_timing(start.elapsed().as_millis() as u64),
            )
        }
    }
}

pub async fn batch_predict(
    scorer: web::Data<Arc<Scorer>>,
    settings: web::Data<Settings>,
    req: web::Json<BatchPredictionRequest>,
) -> impl Responder {
    let start = Instant::now();

    if req.texts.is_empty() {
        return HttpResponse::BadRequest().json(
            ApiResponse::<BatchPredictionResponse>::error("Text list cannot be empty")
                .with_timing(start.elapsed().as_millis() as u64),
        );
    }
    if req.texts.len() > settings.batch_size_limit {
        return HttpResponse::BadRequest().json(
            ApiResponse::<BatchPredictionResponse>::error(&format!(
                "Batch size too large (max {})",
                settings.batch_size_limit
            ))
            .with_timing(start.elapsed().as_millis() as u64),
        );
    }

    info!("Batch prediction request: {} texts", req.texts.len());
    let scorer = scorer.get_ref().clone();
    let texts = req.into_inner().texts;

    match web::block(move || scorer.predict_batch(&texts)).await {
        Ok(Ok(results)) => {
            let results = results
                .into_iter()
                .map(|(text, predictions)| BatchPredictionItem { text, predictions })
                .collect();
            HttpResponse::Ok().json(
                ApiResponse::success(BatchPredictionResponse { results })
                    .with_timing(start.elapsed().as_millis() as u64),
            )
        }
        Ok(Err(e)) => {
            error!("Batch prediction failed: {}", e);
            HttpResponse::InternalServerError().json(
                ApiResponse::<BatchPredictionResponse>::error("Internal server error")
                    .with_timing(start.elapsed().as_millis() as u64),
            )
        }
        Err(e) => {
            error!("Blocking execution failed: {}", e);
            HttpResponse::InternalServerError().json(
                ApiResponse::<BatchPredictionResponse>::error("Internal server error")
                    .with_timing(start.elapsed().as_millis() as u64),
            )
        }
    }
}

fn sanitize_filename(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Receives an anomaly workbook, validates its header row and kicks
/// off background scoring. The response does not wait for the
/// background task.
pub async fn upload(
    scorer: web::Data<Arc<Scorer>>,
    settings: web::Data<Settings>,
    mut payload: Multipart,
) -> impl Responder {
    let mut filename = String::new();
    let mut bytes: Vec<u8> = Vec::new();

    loop {
        match payload.try_next().await {
            Ok(Some(mut field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .unwrap_or("anomalies.xlsx")
                    .to_string();
                loop {
                    match field.try_next().await {
                        Ok(Some(chunk)) => bytes.extend_from_slice(&chunk),
                        Ok(None) => break,
                        Err(e) => {
                            warn!("Upload stream error: {}", e);
                            return HttpResponse::BadRequest().json(
                                ApiResponse::<UploadAccepted>::error("Upload failed"),
                            );
                        }
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart payload: {}", e);
                return HttpResponse::BadRequest()
                    .json(ApiResponse::<UploadAccepted>::error("Upload failed"));
            }
        }
    }

    if bytes.is_empty() {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<UploadAccepted>::error("No file uploaded"));
    }
    if !filename.ends_with(".xlsx") && !filename.ends_with(".xls") {
        return HttpResponse::BadRequest().json(ApiResponse::<UploadAccepted>::error(
            "Only Excel files are allowed",
        ));
    }

    let stored_name = format!(
        "anomalies-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        sanitize_filename(&filename)
    );
    let stored_path = PathBuf::from(&settings.upload_dir).join(&stored_name);

    if let Err(e) = fs::create_dir_all(&settings.upload_dir) {
        error!("Failed to create upload dir: {}", e);
        return HttpResponse::InternalServerError()
            .json(ApiResponse::<UploadAccepted>::error("Internal server error"));
    }
    if let Err(e) = fs::write(&stored_path, &bytes) {
        error!("Failed to store upload: {}", e);
        return HttpResponse::InternalServerError()
            .json(ApiResponse::<UploadAccepted>::error("Internal server error"));
    }
    info!("Stored upload at {:?}", stored_path);

    let requested_sheet = filename.clone();
    let read_path = stored_path.clone();
    let extracted =
        match web::block(move || sheet::read_workbook(read_path, Some(requested_sheet.as_str())))
            .await
        {
            Ok(Ok(extracted)) => extracted,
            Ok(Err(SheetError::MissingColumns(missing))) => {
                return HttpResponse::BadRequest().json(ApiResponse::<UploadAccepted>::error(
                    &format!("Missing required columns: {}", missing.join(", ")),
                ));
            }
            Ok(Err(e)) => {
                warn!("Failed to read workbook {:?}: {}", stored_path, e);
                return HttpResponse::BadRequest()
                    .json(ApiResponse::<UploadAccepted>::error("Failed to read workbook"));
            }
            Err(e) => {
                error!("Blocking execution failed: {}", e);
                return HttpResponse::InternalServerError()
                    .json(ApiResponse::<UploadAccepted>::error("Internal server error"));
            }
        };

    let accepted = UploadAccepted {
        filename: stored_name,
        sheet_used: extracted.sheet_used.clone(),
        total_rows: extracted.total_rows,
        processing: true,
    };

    let scorer = scorer.get_ref().clone();
    let forward_url = settings.forward_url.clone();
    let chunk = settings.forward_chunk;
    actix_web::rt::spawn(async move {
        process_sheet(scorer, extracted, forward_url, chunk).await;
    });

    HttpResponse::Ok().json(ApiResponse::success(accepted))
}

pub async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(ApiResponse::<()>::error("Endpoint not found"))
}
