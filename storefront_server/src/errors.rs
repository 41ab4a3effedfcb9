use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use storefront_engine::StorefrontApiError;
use stripe_tools::StripeApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Authentication error. {0}")]
    AuthenticationError(String),
    #[error("You do not have permission to perform that action.")]
    InsufficientPermissions,
    #[error("The requested resource was not found.")]
    NoRecordFound,
    #[error("This action is not allowed for the order in its current state. {0}")]
    UnsupportedOrderState(String),
    #[error("Backend storage error. {0}")]
    BackendError(#[from] StorefrontApiError),
    #[error("The payment provider rejected the request. {0}")]
    PaymentProviderError(#[from] StripeApiError),
    #[error("IO error. {0}")]
    IOError(#[from] std::io::Error),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions => StatusCode::FORBIDDEN,
            Self::NoRecordFound => StatusCode::NOT_FOUND,
            Self::UnsupportedOrderState(_) => StatusCode::BAD_REQUEST,
            Self::BackendError(e) => match e {
                StorefrontApiError::EmptyCart |
                StorefrontApiError::QuantityInvalid(_) |
                StorefrontApiError::AmountOverflow => StatusCode::BAD_REQUEST,
                StorefrontApiError::InsufficientStock { .. } => StatusCode::CONFLICT,
                StorefrontApiError::ProductNotFound(_) |
                StorefrontApiError::UserNotFound(_) |
                StorefrontApiError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                StorefrontApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::PaymentProviderError(_) => StatusCode::BAD_GATEWAY,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = json!({"error": self.to_string()});
        HttpResponse::build(self.status_code()).json(body)
    }
}
