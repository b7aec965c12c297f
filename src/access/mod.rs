//! Static allow-list gate.
//!
//! The bot serves a fixed set of Telegram users. Every command and callback
//! handler calls [`AccessList::check`] before doing anything else; there is
//! no wrapper magic around handlers.

use teloxide::types::UserId;

use crate::error::HikariError;

#[derive(Debug, Clone, Default)]
pub struct AccessList {
    allowed: Vec<u64>,
}

impl AccessList {
    pub fn new(allowed: Vec<u64>) -> Self {
        Self { allowed }
    }

    pub fn is_allowed(&self, user_id: UserId) -> bool {
        self.allowed.contains(&user_id.0)
    }

    /// Gate used at the top of every handler.
    pub fn check(&self, user_id: UserId) -> Result<(), HikariError> {
        if self.is_allowed(user_id) {
            Ok(())
        } else {
            Err(HikariError::AccessDenied(user_id.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_users_pass() {
        let access = AccessList::new(vec![10, 20]);
        assert!(access.check(UserId(10)).is_ok());
        assert!(access.check(UserId(20)).is_ok());
    }

    #[test]
    fn unlisted_users_are_denied() {
        let access = AccessList::new(vec![10]);
        assert!(matches!(
            access.check(UserId(99)),
            Err(HikariError::AccessDenied(99))
        ));
    }

    #[test]
    fn empty_list_denies_everyone() {
        let access = AccessList::new(vec![]);
        assert!(access.check(UserId(1)).is_err());
    }
}
