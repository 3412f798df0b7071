//! Acting-principal capability consumed by authorized predicates.
//!
//! Session and token resolution live outside core; predicates only need the
//! user id of whoever is acting.

use crate::model::Id;

/// Exposes the user id of the acting principal.
pub trait Authorizer {
    fn user_id(&self) -> Id;
}

/// Authorizer for a resolved user session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSession {
    user_id: Id,
}

impl UserSession {
    pub fn new(user_id: Id) -> Self {
        Self { user_id }
    }
}

impl Authorizer for UserSession {
    fn user_id(&self) -> Id {
        self.user_id
    }
}

impl<A: Authorizer + ?Sized> Authorizer for &A {
    fn user_id(&self) -> Id {
        (**self).user_id()
    }
}
