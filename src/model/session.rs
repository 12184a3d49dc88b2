use crate::api::models::{ChatId, Contact};

/// Identifies one opening of a conversation. Requests carry the token that
/// was current when they were issued; a response whose token is no longer
/// current belongs to a conversation the user has since left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionToken(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenChat {
    pub chat_id: ChatId,
    pub contact: Contact,
}

#[derive(Debug, Default)]
pub struct Session {
    generation: u64,
    open: Option<OpenChat>,
}

impl Session {
    pub fn open(&mut self, chat_id: ChatId, contact: Contact) -> SessionToken {
        self.generation += 1;
        self.open = Some(OpenChat { chat_id, contact });
        SessionToken(self.generation)
    }

    pub fn current(&self) -> Option<&OpenChat> {
        self.open.as_ref()
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.open.as_ref().map(|_| SessionToken(self.generation))
    }

    pub fn is_current(&self, token: SessionToken) -> bool {
        self.open.is_some() && token.0 == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: i64, name: &str) -> Contact {
        Contact {
            id,
            name: name.to_string(),
            phone: "555".to_string(),
        }
    }

    #[test]
    fn empty_session_has_no_token() {
        let session = Session::default();
        assert!(session.current().is_none());
        assert!(session.token().is_none());
    }

    #[test]
    fn reopening_invalidates_previous_token() {
        let mut session = Session::default();
        let first = session.open(1, contact(7, "Alice"));
        assert!(session.is_current(first));

        let second = session.open(1, contact(7, "Alice"));
        assert!(!session.is_current(first));
        assert!(session.is_current(second));
        assert_eq!(session.token(), Some(second));
        assert_eq!(session.current().map(|c| c.contact.id), Some(7));
    }
}
