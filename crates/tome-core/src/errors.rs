/// Typed error hierarchy for backend-facing operations.
///
/// Every variant is caught at the operation boundary that issued the call
/// and converted into a user-visible report; none propagates further up as
/// an unhandled fault.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure: no response was received at all.
    #[error("backend unreachable: {0}")]
    NetworkUnreachable(String),

    /// The backend answered with a non-success status.
    #[error("backend rejected request ({status}): {body}")]
    BackendRejected { status: u16, body: String },

    /// Client-side rejection before any network activity.
    #[error("{0}")]
    Validation(String),

    /// An operation needed a session and session creation failed.
    #[error("session required: {0}")]
    SessionRequired(#[source] Box<ClientError>),
}

impl ClientError {
    /// Classify a non-2xx HTTP response.
    pub fn from_status(status: u16, body: String) -> Self {
        Self::BackendRejected { status, body }
    }

    pub fn session_required(cause: ClientError) -> Self {
        Self::SessionRequired(Box::new(cause))
    }

    /// Short classification string for logging fields.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::NetworkUnreachable(_) => "network_unreachable",
            Self::BackendRejected { .. } => "backend_rejected",
            Self::Validation(_) => "validation",
            Self::SessionRequired(_) => "session_required",
        }
    }

    /// Human-readable diagnostic for in-transcript error surfacing.
    /// Includes the status code and response body when the backend answered.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::BackendRejected { status, body } if !body.is_empty() => {
                format!("request failed with status {status}: {body}")
            }
            Self::BackendRejected { status, .. } => {
                format!("request failed with status {status}")
            }
            other => format!("request failed: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_status_preserves_status_and_body() {
        let err = ClientError::from_status(500, "index unavailable".into());
        match err {
            ClientError::BackendRejected { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "index unavailable");
            }
            other => panic!("expected BackendRejected, got: {other:?}"),
        }
    }

    #[test]
    fn diagnostic_includes_status_and_body() {
        let err = ClientError::from_status(500, "index unavailable".into());
        let diag = err.diagnostic();
        assert!(diag.contains("500"), "got: {diag}");
        assert!(diag.contains("index unavailable"), "got: {diag}");
    }

    #[test]
    fn diagnostic_without_body_still_names_status() {
        let err = ClientError::from_status(502, String::new());
        assert_eq!(err.diagnostic(), "request failed with status 502");
    }

    #[test]
    fn diagnostic_for_transport_failure() {
        let err = ClientError::NetworkUnreachable("connection refused".into());
        let diag = err.diagnostic();
        assert!(diag.contains("connection refused"), "got: {diag}");
    }

    #[test]
    fn error_kind_strings() {
        assert_eq!(
            ClientError::NetworkUnreachable("x".into()).error_kind(),
            "network_unreachable"
        );
        assert_eq!(
            ClientError::from_status(400, "bad".into()).error_kind(),
            "backend_rejected"
        );
        assert_eq!(ClientError::Validation("empty".into()).error_kind(), "validation");
        assert_eq!(
            ClientError::session_required(ClientError::NetworkUnreachable("x".into())).error_kind(),
            "session_required"
        );
    }

    #[test]
    fn session_required_displays_cause() {
        let err = ClientError::session_required(ClientError::from_status(503, "down".into()));
        let text = err.to_string();
        assert!(text.contains("session required"), "got: {text}");
        assert!(text.contains("503"), "got: {text}");
    }
}
