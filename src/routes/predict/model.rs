use serde::Serialize;

use crate::scoring::{Recommendation, RiskAssessment};

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: Prediction,
}

#[derive(Debug, Serialize)]
pub struct Prediction {
    /// 综合得分
    pub likelihood: f64,
    pub recommendation: Recommendation,
    pub image_score: f64,
    pub symptom_score: f64,
}

impl From<RiskAssessment> for PredictResponse {
    fn from(assessment: RiskAssessment) -> Self {
        PredictResponse {
            prediction: Prediction {
                likelihood: assessment.final_score,
                recommendation: assessment.recommendation,
                image_score: assessment.image_score,
                symptom_score: assessment.symptom_score,
            },
        }
    }
}
