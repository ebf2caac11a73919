use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::booking::{DriverId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Driver,
    Admin,
}

/// Who the caller is. Workflow entry points take this explicitly; there is
/// no ambient auth state to consult.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    pub role: Role,
}

/// Claims payload of an externally-validated token. Validation (signature,
/// expiry) happens before this crate is involved; here it is parse-or-fail.
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(rename = "userId")]
    user_id: i64,
    #[serde(rename = "userName")]
    user_name: String,
    role: Role,
}

/// Explicit session object with a load/clear lifecycle at the login/logout
/// boundaries. Starts empty; `current()` is `None` until `login` succeeds.
#[derive(Debug, Default)]
pub struct Session {
    identity: Option<Identity>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&mut self, claims_json: &str) -> Result<&Identity, AppError> {
        let claims: Claims = serde_json::from_str(claims_json)
            .map_err(|err| AppError::BadRequest(format!("malformed identity claims: {err}")))?;

        Ok(self.identity.insert(Identity {
            id: claims.user_id,
            name: claims.user_name,
            role: claims.role,
        }))
    }

    pub fn clear(&mut self) {
        self.identity = None;
    }

    pub fn current(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self.identity.as_ref() {
            Some(identity) if identity.role == Role::User => Some(UserId(identity.id)),
            _ => None,
        }
    }

    pub fn driver_id(&self) -> Option<DriverId> {
        match self.identity.as_ref() {
            Some(identity) if identity.role == Role::Driver => Some(DriverId(identity.id)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Role, Session};
    use crate::models::booking::DriverId;

    #[test]
    fn login_parses_claims_and_clear_empties_the_session() {
        let mut session = Session::new();
        assert!(session.current().is_none());

        let identity = session
            .login(r#"{"userId": 7, "userName": "asha", "role": "driver"}"#)
            .unwrap();
        assert_eq!(identity.role, Role::Driver);

        assert_eq!(session.driver_id(), Some(DriverId(7)));
        assert_eq!(session.user_id(), None);

        session.clear();
        assert!(session.current().is_none());
        assert_eq!(session.driver_id(), None);
    }

    #[test]
    fn malformed_claims_are_rejected() {
        let mut session = Session::new();
        assert!(session.login("{\"userId\": \"oops\"}").is_err());
        assert!(session.current().is_none());
    }
}
