use crate::api::models::{Chat, ChatId, Contact, ContactId};
use crate::utils::{avatar_initial, format_time};

const NO_MESSAGES: &str = "No messages yet";

/// What activating a list entry does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListAction {
    OpenChat { chat_id: ChatId, contact: Contact },
    NewChat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRow {
    pub key: ChatId,
    pub contact: Contact,
    pub avatar: String,
    pub preview: String,
    pub time: String,
    pub active: bool,
}

impl ChatRow {
    pub fn action(&self) -> ListAction {
        ListAction::OpenChat {
            chat_id: self.key,
            contact: self.contact.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatListEntry {
    Chat(ChatRow),
    /// Trailing "New Chat" item.
    NewChat,
}

impl ChatListEntry {
    pub fn action(&self) -> ListAction {
        match self {
            ChatListEntry::Chat(row) => row.action(),
            ChatListEntry::NewChat => ListAction::NewChat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatListView {
    Loading,
    /// "No chats yet" placeholder; its button triggers [`ListAction::NewChat`].
    Empty,
    Entries(Vec<ChatListEntry>),
}

/// Latest chat summaries, replaced wholesale on every successful load.
#[derive(Debug, Default)]
pub struct ChatList {
    chats: Option<Vec<Chat>>,
}

impl ChatList {
    pub fn replace(&mut self, chats: Vec<Chat>) {
        self.chats = Some(chats);
    }

    pub fn chats(&self) -> &[Chat] {
        self.chats.as_deref().unwrap_or_default()
    }

    pub fn find_by_contact(&self, contact_id: ContactId) -> Option<&Chat> {
        self.chats().iter().find(|c| c.contact_id == contact_id)
    }

    pub fn render(&self, active: Option<ChatId>) -> ChatListView {
        let Some(chats) = &self.chats else {
            return ChatListView::Loading;
        };
        if chats.is_empty() {
            return ChatListView::Empty;
        }
        let mut entries: Vec<ChatListEntry> = chats
            .iter()
            .map(|chat| {
                ChatListEntry::Chat(ChatRow {
                    key: chat.id,
                    contact: chat.contact(),
                    avatar: avatar_initial(&chat.contact_name),
                    preview: chat
                        .last_message
                        .clone()
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| NO_MESSAGES.to_string()),
                    time: format_time(chat.last_message_time.as_deref()),
                    active: active == Some(chat.id),
                })
            })
            .collect();
        entries.push(ChatListEntry::NewChat);
        ChatListView::Entries(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(id: i64, contact_id: i64, name: &str, last: Option<&str>) -> Chat {
        Chat {
            id,
            contact_id,
            contact_name: name.to_string(),
            contact_phone: format!("555-{contact_id:04}"),
            last_message: last.map(str::to_string),
            last_message_time: None,
        }
    }

    #[test]
    fn loading_until_first_list_arrives() {
        let list = ChatList::default();
        assert_eq!(list.render(None), ChatListView::Loading);
    }

    #[test]
    fn entries_keep_server_order_and_end_with_new_chat() {
        let mut list = ChatList::default();
        list.replace(vec![chat(3, 9, "Zoe", Some("later")), chat(1, 7, "Alice", None)]);
        let ChatListView::Entries(entries) = list.render(Some(1)) else {
            panic!("expected entries");
        };
        assert_eq!(entries.len(), 3);
        match (&entries[0], &entries[1]) {
            (ChatListEntry::Chat(zoe), ChatListEntry::Chat(alice)) => {
                assert_eq!(zoe.key, 3);
                assert_eq!(zoe.preview, "later");
                assert!(!zoe.active);
                assert_eq!(alice.avatar, "A");
                assert_eq!(alice.preview, NO_MESSAGES);
                assert!(alice.active);
            }
            other => panic!("unexpected entries: {other:?}"),
        }
        assert_eq!(entries[2], ChatListEntry::NewChat);
        assert_eq!(entries[2].action(), ListAction::NewChat);
    }

    #[test]
    fn row_action_opens_its_chat() {
        let mut list = ChatList::default();
        list.replace(vec![chat(1, 7, "Alice", None)]);
        let ChatListView::Entries(entries) = list.render(None) else {
            panic!("expected entries");
        };
        match entries[0].action() {
            ListAction::OpenChat { chat_id, contact } => {
                assert_eq!(chat_id, 1);
                assert_eq!(contact.id, 7);
                assert_eq!(contact.phone, "555-0007");
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn finds_chat_by_contact() {
        let mut list = ChatList::default();
        list.replace(vec![chat(1, 7, "Alice", None), chat(2, 8, "Bob", None)]);
        assert_eq!(list.find_by_contact(8).map(|c| c.id), Some(2));
        assert!(list.find_by_contact(99).is_none());
    }
}
