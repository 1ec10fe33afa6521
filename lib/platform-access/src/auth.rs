//! Proofs of identity and the per-request authenticated context.

use study_sync_core::UserId;

use crate::session::SessionId;

/// Email reported for callers whose credential carries none.
pub const UNKNOWN_EMAIL: &str = "unknown@email.com";

/// One way a request can prove who sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthProof {
    /// The `session` cookie.
    Session(SessionId),
    /// The credential from `Authorization: Bearer <credential>`.
    Bearer(String),
}

impl AuthProof {
    /// Which kind of proof this is.
    #[must_use]
    pub fn kind(&self) -> ProofKind {
        match self {
            Self::Session(_) => ProofKind::Session,
            Self::Bearer(_) => ProofKind::Bearer,
        }
    }
}

/// Discriminant of [`AuthProof`], kept on the resolved context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofKind {
    Session,
    Bearer,
}

/// The raw proofs found on one request, before any verification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentedProofs {
    pub session: Option<SessionId>,
    pub bearer: Option<String>,
}

impl PresentedProofs {
    /// Collects proofs from a session cookie value and an `Authorization`
    /// header value. Headers using any scheme other than `Bearer` are
    /// ignored.
    #[must_use]
    pub fn from_parts(session_cookie: Option<&str>, authorization: Option<&str>) -> Self {
        let session = session_cookie
            .filter(|v| !v.is_empty())
            .map(SessionId::from);
        let bearer = authorization
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string());
        Self { session, bearer }
    }

    /// The proofs in the order they must be tried: session first, then
    /// bearer.
    #[must_use]
    pub fn in_order(self) -> Vec<AuthProof> {
        self.session
            .map(AuthProof::Session)
            .into_iter()
            .chain(self.bearer.map(AuthProof::Bearer))
            .collect()
    }
}

/// Who a request was attributed to. Exists only for the lifetime of one
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    user_id: UserId,
    email: String,
    proof: ProofKind,
}

impl AuthContext {
    #[must_use]
    pub fn new(user_id: UserId, email: Option<String>, proof: ProofKind) -> Self {
        Self {
            user_id,
            email: email.unwrap_or_else(|| UNKNOWN_EMAIL.to_string()),
            proof,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Which proof resolved this context.
    #[must_use]
    pub fn proof(&self) -> ProofKind {
        self.proof
    }
}
