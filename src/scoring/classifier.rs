use std::path::Path;

use serde::Deserialize;

/// 分类器输入的边长
pub const INPUT_SIZE: u32 = 224;
pub const CHANNELS: usize = 3;

/// 缩放到 `INPUT_SIZE`×`INPUT_SIZE` 的 RGB 图像，按行存储 (HWC)，通道值在 `[0, 1]`
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    data: Vec<f32>,
}

impl NormalizedImage {
    pub const LEN: usize = (INPUT_SIZE * INPUT_SIZE) as usize * CHANNELS;

    /// 长度不等于 [`Self::LEN`] 时返回 `None`
    pub fn from_raw(data: Vec<f32>) -> Option<Self> {
        (data.len() == Self::LEN).then_some(NormalizedImage { data })
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// 坐标超出 `INPUT_SIZE` 时返回 `None`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; CHANNELS]> {
        if x >= INPUT_SIZE || y >= INPUT_SIZE {
            return None;
        }
        let offset = ((y * INPUT_SIZE + x) as usize) * CHANNELS;
        Some([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ])
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid model artifact: {0}")]
    InvalidModel(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// 预先训练好的图像分类函数
///
/// 启动时加载一次，所有请求共享，实现不能持有单次调用的可变状态。
/// 返回值为 `[0, 1]` 区间的概率
pub trait Classifier: Send + Sync {
    fn classify(&self, image: &NormalizedImage) -> Result<f32, ClassifierError>;
}

/// 基于平均池化像素的逻辑回归模型
///
/// 模型文件为 JSON：`{"model_name", "pool", "weights", "bias"}`。图像按 `pool`×`pool`
/// 分块，每块各通道均值组成特征向量，`weights` 共 `(INPUT_SIZE / pool)^2 * 3` 个值，按 HWC 行序排列
#[derive(Debug, Clone, Deserialize)]
pub struct LinearClassifier {
    pub model_name: String,
    pub pool: u32,
    pub weights: Vec<f32>,
    pub bias: f32,
}

impl LinearClassifier {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let raw = std::fs::read_to_string(path)?;
        let model: LinearClassifier = serde_json::from_str(&raw)?;
        model.validate()?;
        Ok(model)
    }

    fn grid(&self) -> u32 {
        INPUT_SIZE / self.pool
    }

    fn validate(&self) -> Result<(), ClassifierError> {
        if self.pool == 0 || INPUT_SIZE % self.pool != 0 {
            return Err(ClassifierError::InvalidModel(format!(
                "pool {} does not divide input size {}",
                self.pool, INPUT_SIZE
            )));
        }
        let expected = (self.grid() * self.grid()) as usize * CHANNELS;
        if self.weights.len() != expected {
            return Err(ClassifierError::InvalidModel(format!(
                "expected {} weights, found {}",
                expected,
                self.weights.len()
            )));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(ClassifierError::InvalidModel(
                "weights must be finite".to_string(),
            ));
        }
        Ok(())
    }

    fn features(&self, image: &NormalizedImage) -> Vec<f32> {
        let grid = self.grid();
        let block_len = (self.pool * self.pool) as f32;
        let mut features = vec![0.0f32; (grid * grid) as usize * CHANNELS];

        for y in 0..INPUT_SIZE {
            for x in 0..INPUT_SIZE {
                let cell = ((y / self.pool) * grid + x / self.pool) as usize * CHANNELS;
                for (c, value) in image.pixel(x, y).into_iter().flatten().enumerate() {
                    features[cell + c] += value;
                }
            }
        }
        for f in &mut features {
            *f /= block_len;
        }
        features
    }
}

impl Classifier for LinearClassifier {
    fn classify(&self, image: &NormalizedImage) -> Result<f32, ClassifierError> {
        let logit = self
            .features(image)
            .iter()
            .zip(&self.weights)
            .map(|(x, w)| x * w)
            .sum::<f32>()
            + self.bias;
        Ok(1.0 / (1.0 + (-logit).exp()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(value: f32) -> NormalizedImage {
        NormalizedImage::from_raw(vec![value; NormalizedImage::LEN]).unwrap()
    }

    fn write_model(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("model.json");
        std::fs::write(&path, body).expect("write");
        path
    }

    #[test]
    fn raw_tensor_must_have_exact_length() {
        assert!(NormalizedImage::from_raw(vec![0.0; 10]).is_none());
        assert!(NormalizedImage::from_raw(vec![0.0; NormalizedImage::LEN]).is_some());
    }

    #[test]
    fn pixel_outside_the_image_is_none() {
        let image = uniform(0.25);
        assert_eq!(image.pixel(223, 223), Some([0.25; CHANNELS]));
        assert_eq!(image.pixel(224, 0), None);
        assert_eq!(image.pixel(0, 224), None);
        assert_eq!(image.pixel(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn zero_weights_yield_sigmoid_of_bias() {
        let model = LinearClassifier {
            model_name: "flat".into(),
            pool: 224,
            weights: vec![0.0; 3],
            bias: 0.0,
        };
        let p = model.classify(&uniform(0.7)).unwrap();
        assert!((p - 0.5).abs() < 1e-6);
    }

    #[test]
    fn brighter_images_score_higher_with_positive_weights() {
        let model = LinearClassifier {
            model_name: "bright".into(),
            pool: 112,
            weights: vec![1.0; 2 * 2 * 3],
            bias: -6.0,
        };
        let dark = model.classify(&uniform(0.0)).unwrap();
        let light = model.classify(&uniform(1.0)).unwrap();
        assert!(dark < 0.01);
        assert!(light > 0.99);
    }

    #[test]
    fn load_reads_json_artifact() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = write_model(
            &dir,
            r#"{"model_name":"m","pool":224,"weights":[0.1,0.2,0.3],"bias":0.5}"#,
        );
        let model = LinearClassifier::load(&path).expect("load");
        assert_eq!(model.model_name, "m");
        assert_eq!(model.weights, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn load_rejects_mismatched_weights() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = write_model(
            &dir,
            r#"{"model_name":"m","pool":112,"weights":[0.1],"bias":0.0}"#,
        );
        let err = LinearClassifier::load(&path).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidModel(_)));
    }

    #[test]
    fn load_rejects_pool_that_does_not_divide_input() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = write_model(
            &dir,
            r#"{"model_name":"m","pool":5,"weights":[],"bias":0.0}"#,
        );
        assert!(matches!(
            LinearClassifier::load(&path),
            Err(ClassifierError::InvalidModel(_))
        ));
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = write_model(&dir, "not json");
        assert!(matches!(
            LinearClassifier::load(&path),
            Err(ClassifierError::Parse(_))
        ));
    }
}
