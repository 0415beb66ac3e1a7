/// The identity a request is evaluated against.
///
/// Any authenticated caller counts as staff; `roles` is carried through from
/// the identity provider but no decision reads it yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub authenticated: bool,
    pub identity: Option<String>,
    pub roles: Vec<String>,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn staff(identity: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            authenticated: true,
            identity: Some(identity.into()),
            roles,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}
