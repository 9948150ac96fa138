use std::sync::Arc;
use std::time::Duration;

use image::{ImageFormat, imageops::FilterType};
use tokio::sync::Semaphore;

use super::classifier::{Classifier, INPUT_SIZE, NormalizedImage};

#[derive(Debug, thiserror::Error)]
pub enum ImageScoreError {
    #[error("image could not be decoded: {0}")]
    UnreadableImage(String),
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("classifier unavailable: {0}")]
    ClassifierUnavailable(String),
    #[error("inference timed out after {0:?}")]
    Timeout(Duration),
}

/// 解码 PNG/JPEG，缩放到分类器输入尺寸，通道值归一化到 `[0, 1]`
pub fn normalize(bytes: &[u8]) -> Result<NormalizedImage, ImageScoreError> {
    let format = image::guess_format(bytes)
        .map_err(|e| ImageScoreError::UnreadableImage(e.to_string()))?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(ImageScoreError::UnsupportedFormat(format!("{:?}", format)));
    }

    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageScoreError::UnreadableImage(e.to_string()))?;
    let rgb = decoded
        .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Nearest)
        .to_rgb8();

    let data = rgb
        .into_raw()
        .into_iter()
        .map(|v| f32::from(v) / 255.0)
        .collect();
    NormalizedImage::from_raw(data).ok_or_else(|| {
        ImageScoreError::UnreadableImage("resized image has unexpected dimensions".to_string())
    })
}

/// 在阻塞线程池上运行分类器，限制并发数并设置单次超时
pub struct ImageScorer {
    classifier: Arc<dyn Classifier>,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl ImageScorer {
    pub fn new(classifier: Arc<dyn Classifier>, max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            classifier,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
        }
    }

    /// 返回 `[0, 100]` 区间的图像得分
    pub async fn score(&self, bytes: Vec<u8>) -> Result<f64, ImageScoreError> {
        let deadline = self.timeout;
        let classifier = Arc::clone(&self.classifier);
        let permits = Arc::clone(&self.permits);

        let run = async move {
            // 许可随阻塞任务一起释放，超时后推理仍占用名额
            let permit = permits.acquire_owned().await.map_err(|_| {
                ImageScoreError::ClassifierUnavailable("inference pool closed".to_string())
            })?;
            let probability = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let image = normalize(&bytes)?;
                classifier
                    .classify(&image)
                    .map_err(|e| ImageScoreError::ClassifierUnavailable(e.to_string()))
            })
            .await
            .map_err(|e| {
                ImageScoreError::ClassifierUnavailable(format!("inference task failed: {}", e))
            })??;
            Ok::<f32, ImageScoreError>(probability)
        };

        let probability = tokio::time::timeout(deadline, run)
            .await
            .map_err(|_| ImageScoreError::Timeout(deadline))??;

        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ImageScoreError::ClassifierUnavailable(format!(
                "classifier returned {} outside [0, 1]",
                probability
            )));
        }

        Ok(f64::from(probability) * 100.0)
    }
}
