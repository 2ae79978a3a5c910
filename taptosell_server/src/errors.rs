use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use taptosell_engine::traits::{AuthApiError, LedgerApiError, MarketplaceError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Cannot carry out the request. {0}")]
    CannotComplete(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::CannotComplete(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No bearer token was provided.")]
    MissingToken,
    #[error("The bearer token is invalid or has been revoked.")]
    InvalidToken,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
}

impl From<MarketplaceError> for ServerError {
    fn from(e: MarketplaceError) -> Self {
        match &e {
            MarketplaceError::ProductNotFound(_) |
            MarketplaceError::OrderNotFound(_) |
            MarketplaceError::WithdrawalNotFound(_) |
            MarketplaceError::PriceChangeNotFound(_) => Self::NoRecordFound(e.to_string()),
            MarketplaceError::OrderOwnership(_) | MarketplaceError::ProductOwnership(_) => {
                Self::InsufficientPermissions(e.to_string())
            },
            MarketplaceError::IllegalTransition { .. } |
            MarketplaceError::InsufficientFunds(_) |
            MarketplaceError::AmountNotPositive(_) |
            MarketplaceError::PriceError(_) |
            MarketplaceError::WithdrawalAlreadyProcessed(_) |
            MarketplaceError::PriceChangeAlreadyResolved(_) |
            MarketplaceError::InvalidCommission(_) => Self::CannotComplete(e.to_string()),
            MarketplaceError::DatabaseError(_) | MarketplaceError::LedgerError(_) => {
                error!("💻️ Marketplace backend error: {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<LedgerApiError> for ServerError {
    fn from(e: LedgerApiError) -> Self {
        match e {
            LedgerApiError::QueryError(s) => Self::InvalidRequestBody(s),
            LedgerApiError::DatabaseError(s) => {
                error!("💻️ Ledger backend error: {s}");
                Self::BackendError(s)
            },
        }
    }
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::TokenNotFound => Self::AuthenticationError(AuthError::InvalidToken),
            AuthApiError::RoleNotFound(_) => Self::AuthenticationError(AuthError::InsufficientPermissions(e.to_string())),
            AuthApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}
