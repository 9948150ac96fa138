#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use backend::{
    AppState,
    config::Config,
    database::MemoryCredentialStore,
    routes,
    scoring::{Classifier, ClassifierError, NormalizedImage},
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-secret";
const BOUNDARY: &str = "----ctscreen-test-boundary";

pub struct FixedClassifier(pub f32);

impl Classifier for FixedClassifier {
    fn classify(&self, _image: &NormalizedImage) -> Result<f32, ClassifierError> {
        Ok(self.0)
    }
}

pub struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn classify(&self, _image: &NormalizedImage) -> Result<f32, ClassifierError> {
        Err(ClassifierError::Inference("model session lost".to_string()))
    }
}

pub fn test_config() -> Config {
    Config {
        jwt_secret: JWT_SECRET.to_string(),
        bcrypt_cost: 4,
        max_concurrent_inferences: 2,
        ..Config::default()
    }
}

pub fn app_with(classifier: impl Classifier + 'static) -> Router {
    app_with_config(test_config(), classifier)
}

pub fn app_with_config(config: Config, classifier: impl Classifier + 'static) -> Router {
    let state = AppState::new(
        config,
        Arc::new(MemoryCredentialStore::new()),
        Arc::new(classifier),
    );
    routes::router(state)
}

pub fn app() -> Router {
    app_with(FixedClassifier(0.5))
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response: Response<Body> = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

pub fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn png_bytes() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([90, 120, 150])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

pub enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: Vec<u8>,
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub fn multipart_request(uri: &str, parts: Vec<Part<'_>>) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&bytes);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                        name, value
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn png_part(filename: &str) -> Part<'_> {
    Part::File {
        name: "image",
        filename,
        content_type: "image/png",
        bytes: png_bytes(),
    }
}
