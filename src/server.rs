use axum::{
    Form, Json, Router,
    extract::State,
    response::Html,
    routing::{get, post},
};
use metrics::counter;
use serde::Deserialize;
use std::sync::Arc;

use crate::engine::Engine;
use crate::error::ApiError;
use crate::page::{self, EMPTY_INPUT_WARNING, Outcome, PageView};
use crate::types::{ClassificationRequest, ClassificationResponse, ModelInfo, ModelKind};

#[derive(Clone)]
pub struct AppState {
    engine: Arc<dyn Engine + Send + Sync>,
    default_model: ModelKind,
}

impl AppState {
    pub fn new(engine: Arc<dyn Engine + Send + Sync>, default_model: ModelKind) -> Self {
        Self {
            engine,
            default_model,
        }
    }
}

/// Application routes. `main` adds `/metrics` and the tracing layer on top.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/analyze", post(analyze_handler))
        .route("/classify", post(classify_handler))
        .route("/models", get(models_handler))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(page::render(&PageView {
        model: state.default_model,
        text: "",
        outcome: Outcome::None,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeForm {
    pub model: ModelKind,
    #[serde(default)]
    pub text: String,
}

#[tracing::instrument(skip(state, form), fields(model = %form.model, text_len = form.text.len()))]
async fn analyze_handler(
    State(state): State<AppState>,
    Form(form): Form<AnalyzeForm>,
) -> Html<String> {
    counter!("classification_requests_total").increment(1);

    let outcome = if form.text.trim().is_empty() {
        counter!("empty_input_rejections_total").increment(1);
        tracing::info!("Empty input rejected");
        Outcome::Warning(EMPTY_INPUT_WARNING)
    } else {
        let request = ClassificationRequest::single(form.model, form.text.clone());
        match state.engine.classify(request).await {
            Ok(response) => match response.first() {
                Some((label, confidence)) => Outcome::Result { label, confidence },
                None => Outcome::Warning("The model returned no prediction."),
            },
            Err(e) => {
                tracing::error!(error = %e, "Classification failed");
                Outcome::Warning("Analysis failed, please try again.")
            }
        }
    };

    Html(page::render(&PageView {
        model: form.model,
        text: &form.text,
        outcome,
    }))
}

#[tracing::instrument(skip(state, request), fields(input_count = request.input.len(), model = %request.model))]
async fn classify_handler(
    State(state): State<AppState>,
    Json(request): Json<ClassificationRequest>,
) -> Result<Json<ClassificationResponse>, ApiError> {
    counter!("classification_requests_total").increment(1);

    if request.input.is_empty() {
        return Err(ApiError::NoInput);
    }
    if let Some(index) = request.first_blank_input() {
        counter!("empty_input_rejections_total").increment(1);
        return Err(ApiError::EmptyInput { index });
    }

    tracing::info!("Processing classification request");
    let response = state.engine.classify(request).await?;
    tracing::info!("Classification completed successfully");
    Ok(Json(response))
}

async fn models_handler() -> Json<Vec<ModelInfo>> {
    Json(
        ModelKind::ALL
            .into_iter()
            .map(|kind| ModelInfo {
                id: kind,
                name: kind.display_name(),
            })
            .collect(),
    )
}
