//! Walks extracted spreadsheet rows through the scorer and forwards
//! the scored records to an external ingestion endpoint.
//!
//! Forwarding is best-effort: a failed chunk is logged and dropped,
//! the walk continues, nothing is retried and no ordering is
//! guaranteed.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::scorer::{CriticalityScores, Scorer};
use crate::sheet::{AnomalyRow, ExtractedSheet};

const FORWARD_TIMEOUT: Duration = Duration::from_secs(10);

/// One spreadsheet row plus the scores the model assigned to it.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub row: AnomalyRow,
    #[serde(flatten)]
    pub scores: CriticalityScores,
}

/// Outcome of one background processing run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSummary {
    pub total_rows: usize,
    pub scored: usize,
    pub skipped: usize,
    pub forwarded: usize,
}

/// Scores every row serially. A row that fails to score is logged and
/// skipped; the walk continues.
pub fn score_rows(scorer: &Scorer, rows: &[AnomalyRow]) -> Vec<ScoredRecord> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match scorer.predict(&row.inference_text()) {
            Ok(scores) => records.push(ScoredRecord {
                row: row.clone(),
                scores,
            }),
            Err(e) => {
                log::warn!(
                    "Skipping row for equipment {:?}: {}",
                    row.num_equipement,
                    e
                );
            }
        }
    }
    records
}

/// POSTs records to `url` in chunks. Returns how many records were
/// accepted (2xx responses).
pub async fn forward_records(url: &str, records: &[ScoredRecord], chunk_size: usize) -> usize {
    let client = match reqwest::Client::builder().timeout(FORWARD_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to build forwarding client: {}", e);
            return 0;
        }
    };

    let chunk_size = chunk_size.max(1);
    let mut forwarded = 0;
    for chunk in records.chunks(chunk_size) {
        match client.post(url).json(chunk).send().await {
            Ok(response) if response.status().is_success() => {
                forwarded += chunk.len();
            }
            Ok(response) => {
                log::warn!(
                    "Forwarding chunk of {} records rejected with status {}",
                    chunk.len(),
                    response.status()
                );
            }
            Err(e) => {
                log::warn!("Forwarding chunk of {} records failed: {}", chunk.len(), e);
            }
        }
    }
    forwarded
}

/// Scores an extracted sheet on the blocking pool and forwards the
/// results when an endpoint is configured.
pub async fn process_sheet(
    scorer: Arc<Scorer>,
    extracted: ExtractedSheet,
    forward_url: Option<String>,
    chunk_size: usize,
) -> ProcessSummary {
    let total_rows = extracted.total_rows;
    let rows = extracted.rows;

    let records = match tokio::task::spawn_blocking(move || score_rows(&scorer, &rows)).await {
        Ok(records) => records,
        Err(e) => {
            log::error!("Scoring task panicked: {}", e);
            Vec::new()
        }
    };

    let scored = records.len();
    let forwarded = match forward_url {
        Some(url) => forward_records(&url, &records, chunk_size).await,
        None => 0,
    };

    let summary = ProcessSummary {
        total_rows,
        scored,
        skipped: total_rows - scored,
        forwarded,
    };
    log::info!(
        "Processed sheet: {} rows, {} scored, {} skipped, {} forwarded",
        summary.total_rows,
        summary.scored,
        summary.skipped,
        summary.forwarded
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::AnomalyRow;

    fn sample_row() -> AnomalyRow {
        AnomalyRow {
            num_equipement: "EQ-001".into(),
            systeme: "Pompes".into(),
            description: "Fuite d'huile".into(),
            date_detection: "2024-01-15".into(),
            description_equipement: "Pompe P-101".into(),
            section_proprietaire: "Mécanique".into(),
        }
    }

    #[test]
    fn test_scored_record_is_flat() {
        let record = ScoredRecord {
            row: sample_row(),
            scores: CriticalityScores {
                fiabilite_integrite: 2,
                disponibilite: 3,
                process_safety: 1,
                criticite: 6,
            },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["num_equipments"], "EQ-001");
        assert_eq!(json["descreption_anomalie"], "Fuite d'huile");
        assert_eq!(json["criticite"], 6);
        assert!(json.get("row").is_none());
        assert!(json.get("scores").is_none());
    }

    #[tokio::test]
    async fn test_forward_unreachable_endpoint_is_best_effort() {
        let records = vec![ScoredRecord {
            row: sample_row(),
            scores: CriticalityScores {
                fiabilite_integrite: 0,
                disponibilite: 0,
                process_safety: 0,
                criticite: 0,
            },
        }];
        // Nothing listens here; the call must swallow the failure
        let forwarded = forward_records("http://127.0.0.1:1/ingest", &records, 10).await;
        assert_eq!(forwarded, 0);
    }
}
