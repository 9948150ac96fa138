mod handler;
mod model;

pub use handler::{login, protected, register};
pub use model::{LoginRequest, LoginResponse, ProtectedResponse, RegisterRequest, RegisterResponse};
