use shared_error::AppError;
use std::fmt;

/// Errors raised by the engines (Identity, BanEngine, VisitEngine). These are
/// typed so every call site can match on the specific failure instead of
/// string-sniffing a message; the HTTP and realtime edges are the only
/// places that fold them down into [`AppError`]'s taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Validation(String),
    DuplicateEmail,
    DuplicatePhone,
    WeakPassword(String),
    BuildingLicenseExhausted,
    InvalidRole(String),
    InvalidCredentials,
    AccountLocked { remaining_seconds: u64 },
    AuthenticationFailed(String),
    AuthorizationDenied { required: String },
    NotFound(String),
    VisitorBanned(Vec<String>),
    BanAlreadyExists,
    ScanTargetUnknown,
    InvalidTransition(String),
    AllVisitorsProcessed,
    Conflict(String),
    Dependency(String),
    Internal(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Validation(msg) => write!(f, "validation failed: {}", msg),
            EngineError::DuplicateEmail => write!(f, "email already registered"),
            EngineError::DuplicatePhone => write!(f, "phone already registered"),
            EngineError::WeakPassword(msg) => write!(f, "weak password: {}", msg),
            EngineError::BuildingLicenseExhausted => write!(f, "building license exhausted"),
            EngineError::InvalidRole(msg) => write!(f, "invalid role: {}", msg),
            EngineError::InvalidCredentials => write!(f, "invalid credentials"),
            EngineError::AccountLocked { remaining_seconds } => {
                write!(f, "account locked for {}s", remaining_seconds)
            },
            EngineError::AuthenticationFailed(msg) => write!(f, "authentication failed: {}", msg),
            EngineError::AuthorizationDenied { required } => {
                write!(f, "requires role {}", required)
            },
            EngineError::NotFound(msg) => write!(f, "not found: {}", msg),
            EngineError::VisitorBanned(phones) => {
                write!(f, "visitor(s) banned: {}", phones.join(", "))
            },
            EngineError::BanAlreadyExists => write!(f, "an active ban already exists"),
            EngineError::ScanTargetUnknown => write!(f, "no visit matches the scanned code"),
            EngineError::InvalidTransition(msg) => write!(f, "invalid state transition: {}", msg),
            EngineError::AllVisitorsProcessed => write!(f, "all visitors already processed"),
            EngineError::Conflict(msg) => write!(f, "conflict: {}", msg),
            EngineError::Dependency(msg) => write!(f, "dependency error: {}", msg),
            EngineError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => AppError::Validation(msg),
            EngineError::DuplicateEmail => {
                AppError::Conflict("email already registered".to_string())
            },
            EngineError::DuplicatePhone => {
                AppError::Conflict("phone already registered".to_string())
            },
            EngineError::WeakPassword(msg) => AppError::Validation(msg),
            EngineError::BuildingLicenseExhausted => {
                AppError::License("building license exhausted".to_string())
            },
            EngineError::InvalidRole(msg) => AppError::Validation(msg),
            EngineError::InvalidCredentials => {
                AppError::Authentication("invalid credentials".to_string())
            },
            EngineError::AccountLocked { .. } => {
                AppError::Authentication("account locked".to_string())
            },
            EngineError::AuthenticationFailed(msg) => AppError::Authentication(msg),
            EngineError::AuthorizationDenied { .. } => {
                AppError::Authorization("access denied".to_string())
            },
            EngineError::NotFound(msg) => AppError::NotFound(msg),
            EngineError::VisitorBanned(phones) => {
                AppError::Conflict(format!("visitor(s) banned: {}", phones.join(", ")))
            },
            EngineError::BanAlreadyExists => {
                AppError::Conflict("an active ban already exists".to_string())
            },
            EngineError::ScanTargetUnknown => {
                AppError::NotFound("no visit matches the scanned code".to_string())
            },
            EngineError::InvalidTransition(msg) => AppError::Conflict(msg),
            EngineError::AllVisitorsProcessed => {
                AppError::Conflict("all visitors already processed".to_string())
            },
            EngineError::Conflict(msg) => AppError::Conflict(msg),
            EngineError::Dependency(msg) => AppError::Dependency(msg),
            EngineError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => EngineError::NotFound("resource not found".to_string()),
            other => EngineError::Dependency(other.to_string()),
        }
    }
}

impl From<AppError> for EngineError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => EngineError::Validation(msg),
            AppError::Authentication(msg) => EngineError::AuthenticationFailed(msg),
            AppError::Authorization(msg) => EngineError::AuthorizationDenied { required: msg },
            AppError::NotFound(msg) => EngineError::NotFound(msg),
            AppError::Conflict(msg) => EngineError::Conflict(msg),
            AppError::RateLimit(retry_after) => {
                EngineError::Conflict(format!("rate limited, retry after {}s", retry_after))
            },
            AppError::License(msg) => EngineError::Conflict(msg),
            AppError::Dependency(msg) => EngineError::Dependency(msg),
            AppError::Internal(msg) => EngineError::Internal(msg),
        }
    }
}

/// Error-code strings matching the authorization-matrix "specific error
/// code" mentions in end-to-end scenarios (e.g. `AccountLocked`,
/// `VisitorBanned`). Used for call-site matching and structured logging;
/// the HTTP and WS edges still fold down to [`AppError`]'s own taxonomy of
/// `code`s rather than threading this string into the response body, so a
/// client can't branch on more detail than the stable taxonomy promises.
impl EngineError {
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "Validation",
            EngineError::DuplicateEmail => "DuplicateEmail",
            EngineError::DuplicatePhone => "DuplicatePhone",
            EngineError::WeakPassword(_) => "WeakPassword",
            EngineError::BuildingLicenseExhausted => "BuildingLicenseExhausted",
            EngineError::InvalidRole(_) => "InvalidRole",
            EngineError::InvalidCredentials => "InvalidCredentials",
            EngineError::AccountLocked { .. } => "AccountLocked",
            EngineError::AuthenticationFailed(_) => "AuthenticationFailed",
            EngineError::AuthorizationDenied { .. } => "AuthorizationDenied",
            EngineError::NotFound(_) => "NotFound",
            EngineError::VisitorBanned(_) => "VisitorBanned",
            EngineError::BanAlreadyExists => "BanAlreadyExists",
            EngineError::ScanTargetUnknown => "ScanTargetUnknown",
            EngineError::InvalidTransition(_) => "InvalidTransition",
            EngineError::AllVisitorsProcessed => "AllVisitorsProcessed",
            EngineError::Conflict(_) => "Conflict",
            EngineError::Dependency(_) => "Dependency",
            EngineError::Internal(_) => "Internal",
        }
    }
}
