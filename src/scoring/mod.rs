//! 风险评分：症状规则、图像分类与综合得分

mod classifier;
mod composer;
mod imaging;
mod provision;
mod symptoms;

pub use classifier::{
    CHANNELS, Classifier, ClassifierError, INPUT_SIZE, LinearClassifier, NormalizedImage,
};
pub use composer::{
    DEFAULT_IMAGE_WEIGHT, DEFAULT_THRESHOLD, Recommendation, RiskAssessment, RiskWeights,
    compose,
};
pub use imaging::{ImageScoreError, ImageScorer, normalize};
pub use provision::{ProvisionError, ensure_model};
pub use symptoms::{MAX_SYMPTOM_SCORE, SYMPTOM_VOCABULARY, symptom_score};
