use thiserror::Error;

/// Failures of a single allocation run. Nothing is returned alongside these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("no videos match the selected categories")]
    EmptyCatalog,

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("user id {0} is already taken")]
    DuplicateUser(String),

    #[error("unknown user {0}")]
    UnknownUser(String),

    #[error("record store lock was poisoned")]
    Poisoned,
}

/// Errors talking to an upstream HTTP service (LLM or video metadata).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid playlist url: {0}")]
    InvalidPlaylistUrl(String),

    #[error("missing configuration: {0}")]
    NotConfigured(&'static str),
}

/// Everything a request handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Upstream(#[from] ClientError),

    #[error("{0}")]
    BadRequest(String),

    #[error("invalid user id or password")]
    BadCredentials,

    #[error("missing or expired session")]
    NoSession,

    #[error("{0} not found")]
    NotFound(String),
}

impl warp::reject::Reject for ApiError {}

impl ApiError {
    pub fn status(&self) -> warp::http::StatusCode {
        use warp::http::StatusCode;

        match self {
            ApiError::Allocation(AllocationError::EmptyCatalog) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Allocation(AllocationError::InvalidParameter(_)) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::DuplicateUser(_)) => StatusCode::CONFLICT,
            ApiError::Store(StoreError::UnknownUser(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(ClientError::InvalidPlaylistUrl(_)) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::BadCredentials | ApiError::NoSession => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

#[cfg(test)]
mod test {
    use warp::http::StatusCode;

    use super::*;

    #[test]
    pub fn test_status_mapping() {
        assert_eq!(
            ApiError::from(AllocationError::EmptyCatalog).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(AllocationError::InvalidParameter("num_days")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(StoreError::DuplicateUser("kim".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::NoSession.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(ClientError::Malformed("no choices".into())).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
