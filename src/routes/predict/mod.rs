mod handler;
mod model;

pub use handler::predict;
pub use model::{Prediction, PredictResponse};
