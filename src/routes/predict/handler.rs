use axum::{
    body::Bytes,
    extract::{
        Json, State,
        multipart::{Multipart, MultipartError, MultipartRejection},
    },
    http::StatusCode,
};

use crate::{AppState, error::AppError, scoring::symptom_score};

use super::model::PredictResponse;

const ALLOWED_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".jpeg"];

struct Upload {
    filename: String,
    bytes: Bytes,
}

#[axum::debug_handler]
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::InvalidInput(e.body_text()))?;

    let mut upload: Option<Upload> = None;
    let mut symptoms: Vec<String> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if upload.is_none() {
                    upload = Some(Upload { filename, bytes });
                }
            }
            Some("symptoms") => {
                let text = field.text().await.map_err(multipart_error)?;
                symptoms.extend(parse_symptoms(&text));
            }
            // 其他字段（如 name、age）忽略
            _ => {}
        }
    }

    let upload =
        upload.ok_or_else(|| AppError::InvalidInput("CT scan image is required".to_string()))?;
    if !has_allowed_extension(&upload.filename) {
        return Err(AppError::InvalidInput(
            "Invalid file format. Please upload a PNG or JPG image".to_string(),
        ));
    }

    let symptom_score = symptom_score(&symptoms);
    let image_score = state.image_scorer.score(upload.bytes.to_vec()).await?;
    let assessment = state.risk_weights.compose(image_score, symptom_score);

    tracing::info!(
        "Prediction: image={:.3} symptoms={:.3} final={:.3} -> {}",
        assessment.image_score,
        assessment.symptom_score,
        assessment.final_score,
        assessment.recommendation.as_str()
    );

    Ok(Json(PredictResponse::from(assessment)))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::InvalidInput(err.body_text())
    }
}

fn has_allowed_extension(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// 支持重复字段，也支持单个字段中的 JSON 字符串数组
fn parse_symptoms(value: &str) -> Vec<String> {
    if value.trim_start().starts_with('[') {
        if let Ok(list) = serde_json::from_str::<Vec<String>>(value) {
            return list;
        }
    }
    vec![value.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_case_insensitive() {
        assert!(has_allowed_extension("scan.PNG"));
        assert!(has_allowed_extension("scan.jpeg"));
        assert!(has_allowed_extension("a.b.JpG"));
        assert!(!has_allowed_extension("scan.gif"));
        assert!(!has_allowed_extension("png"));
        assert!(!has_allowed_extension(""));
    }

    #[test]
    fn plain_symptom_value_is_one_label() {
        assert_eq!(parse_symptoms("shortness of breath"), vec!["shortness of breath"]);
    }

    #[test]
    fn json_array_value_is_expanded() {
        assert_eq!(
            parse_symptoms(r#"["fever","cold"]"#),
            vec!["fever".to_string(), "cold".to_string()]
        );
    }

    #[test]
    fn malformed_json_falls_back_to_literal() {
        assert_eq!(parse_symptoms("[fever"), vec!["[fever"]);
    }
}
