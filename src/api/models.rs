use serde::{Deserialize, Serialize};

pub type ChatId = i64;
pub type ContactId = i64;
pub type MessageId = i64;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub phone: String,
}

/// Conversation summary as listed by `GET /api/chats`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: ChatId,
    pub contact_id: ContactId,
    pub contact_name: String,
    pub contact_phone: String,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_time: Option<String>,
}

impl Chat {
    pub fn contact(&self) -> Contact {
        Contact {
            id: self.contact_id,
            name: self.contact_name.clone(),
            phone: self.contact_phone.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender_name: String,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OutgoingMessage<'a> {
    pub message: &'a str,
}

/// `{ "error": "..." }` bodies the server answers with on failure.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct LoginForm<'a> {
    pub phone: &'a str,
    pub name: &'a str,
}
