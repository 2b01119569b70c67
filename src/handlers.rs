use crate::errors::{AnalysisError, AppError};
use crate::models::{Analysis, AnalyzeQuery, AnalyzeResponse, HourPoint};
use crate::state::AppState;
use crate::ui::{PageView, render_index};
use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use chrono::FixedOffset;
use tracing::error;

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
) -> Html<String> {
    let Some(keyword) = query.keyword else {
        return Html(render_index(&PageView::Empty));
    };

    let view = match state.aggregator.compute(&keyword).await {
        Ok(analysis) => PageView::Analysed(to_response(&keyword, analysis, state.aggregator.offset())),
        Err(err) => {
            log_failure(&keyword, &err);
            PageView::Failed {
                keyword: keyword.trim().to_string(),
                message: AppError::from(err).message,
            }
        }
    };
    Html(render_index(&view))
}

pub async fn analyze(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let keyword = query.keyword.unwrap_or_default();
    let analysis = state.aggregator.compute(&keyword).await.map_err(|err| {
        log_failure(&keyword, &err);
        AppError::from(err)
    })?;

    Ok(Json(to_response(&keyword, analysis, state.aggregator.offset())))
}

pub async fn health() -> &'static str {
    "ok"
}

fn log_failure(keyword: &str, err: &AnalysisError) {
    if let AnalysisError::Fetch(fetch) = err {
        error!("analysis of '{}' failed: {fetch}", keyword.trim());
    }
}

pub fn to_response(keyword: &str, analysis: Analysis, offset: FixedOffset) -> AnalyzeResponse {
    let keyword = keyword.trim().to_string();
    match analysis {
        Analysis::NoData => AnalyzeResponse::NoData { keyword },
        Analysis::Ready(result) => AnalyzeResponse::Ready {
            keyword,
            best_hour: result.best_hour,
            best_hour_label: hour_label(result.best_hour, offset),
            confidence: result.confidence,
            curve: result
                .curve
                .iter()
                .map(|(hour, value)| HourPoint { hour, value })
                .collect(),
        },
    }
}

pub fn hour_label(hour: u8, offset: FixedOffset) -> String {
    if offset.local_minus_utc() == 0 {
        format!("{hour:02}:00 UTC")
    } else {
        format!("{hour:02}:00 UTC{offset}")
    }
}
