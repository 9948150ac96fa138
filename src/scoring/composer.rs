use serde::Serialize;

/// 图像得分在最终得分中的权重
pub const DEFAULT_IMAGE_WEIGHT: f64 = 0.8;

/// 最终得分不低于该值时建议就医
pub const DEFAULT_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskWeights {
    pub image_weight: f64,
    pub threshold: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        RiskWeights {
            image_weight: DEFAULT_IMAGE_WEIGHT,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recommendation {
    #[serde(rename = "see a doctor")]
    SeeADoctor,
    #[serde(rename = "monitor symptoms")]
    MonitorSymptoms,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::SeeADoctor => "see a doctor",
            Recommendation::MonitorSymptoms => "monitor symptoms",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskAssessment {
    pub image_score: f64,
    pub symptom_score: f64,
    /// 不做归一化，两项得分都高时可能超过 100
    pub final_score: f64,
    pub recommendation: Recommendation,
}

impl RiskWeights {
    pub fn compose(&self, image_score: f64, symptom_score: f64) -> RiskAssessment {
        let final_score = self.image_weight * image_score + symptom_score;
        let recommendation = if final_score >= self.threshold {
            Recommendation::SeeADoctor
        } else {
            Recommendation::MonitorSymptoms
        };

        RiskAssessment {
            image_score,
            symptom_score,
            final_score,
            recommendation,
        }
    }
}

/// 使用默认权重和阈值的 [`RiskWeights::compose`]
pub fn compose(image_score: f64, symptom_score: f64) -> RiskAssessment {
    RiskWeights::default().compose(image_score, symptom_score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_sum_of_sub_scores() {
        let assessment = compose(50.0, 10.0);
        assert!((assessment.final_score - 50.0).abs() < 1e-9);
        assert_eq!(assessment.recommendation, Recommendation::MonitorSymptoms);
    }

    #[test]
    fn threshold_is_inclusive() {
        // 0.8 * 75 = 60，加 10 正好等于阈值
        let assessment = compose(75.0, 10.0);
        assert!((assessment.final_score - 70.0).abs() < 1e-9);
        assert_eq!(assessment.recommendation, Recommendation::SeeADoctor);

        let exact = compose(0.0, 70.0);
        assert_eq!(exact.final_score, 70.0);
        assert_eq!(exact.recommendation, Recommendation::SeeADoctor);
    }

    #[test]
    fn just_below_threshold_monitors() {
        let assessment = compose(0.0, 69.999);
        assert_eq!(assessment.recommendation, Recommendation::MonitorSymptoms);
    }

    #[test]
    fn final_score_may_exceed_one_hundred() {
        let assessment = compose(100.0, 20.0);
        assert!((assessment.final_score - 100.0).abs() < 1e-9);
        let inflated = compose(100.0, 40.0);
        assert!(inflated.final_score > 100.0);
        assert_eq!(inflated.recommendation, Recommendation::SeeADoctor);
    }

    #[test]
    fn custom_weights_apply() {
        let weights = RiskWeights {
            image_weight: 0.5,
            threshold: 40.0,
        };
        let assessment = weights.compose(80.0, 0.0);
        assert_eq!(assessment.final_score, 40.0);
        assert_eq!(assessment.recommendation, Recommendation::SeeADoctor);
    }

    #[test]
    fn recommendation_serializes_as_phrase() {
        assert_eq!(
            serde_json::to_string(&Recommendation::SeeADoctor).unwrap(),
            "\"see a doctor\""
        );
        assert_eq!(Recommendation::MonitorSymptoms.as_str(), "monitor symptoms");
    }
}
