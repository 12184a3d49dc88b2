//! Toolkit-independent state of the chat window.
//!
//! Every user-visible operation is split in two: an issuing method decides
//! whether a request goes out and returns a descriptor for it, and an
//! `apply_*` method consumes the response on the main loop. The GTK layer
//! runs the HTTP call in between. Descriptors carry the session token or list
//! sequence number they were issued under so that late responses can be
//! recognised and dropped.

pub mod chat_list;
pub mod contacts;
pub mod session;
pub mod thread;

use crate::api::ApiError;
use crate::api::models::{Chat, ChatId, Contact, ContactId, Message};

pub use chat_list::{ChatListEntry, ChatListView, ChatRow, ListAction};
pub use contacts::ContactListView;
pub use session::{OpenChat, SessionToken};
pub use thread::{Direction, MessageRow};

use chat_list::ChatList;
use contacts::ContactList;
use session::Session;
use thread::Thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatsRequest {
    seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessagesRequest {
    pub token: SessionToken,
    pub contact_id: ContactId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub token: SessionToken,
    pub contact_id: ContactId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatRequest {
    pub contact: Contact,
}

/// A chat created through the contacts panel that should be opened once a
/// chat list fetched after the creation arrives.
#[derive(Debug)]
struct PendingOpen {
    contact_id: ContactId,
    min_seq: u64,
}

#[derive(Debug, Default)]
pub struct ChatView {
    session: Session,
    chats: ChatList,
    contacts: ContactList,
    thread: Thread,
    composer: String,
    contacts_panel_open: bool,
    scroll_requests: u64,
    issued_chats_seq: u64,
    applied_chats_seq: u64,
    pending_open: Option<PendingOpen>,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_chats(&mut self) -> ChatsRequest {
        self.issued_chats_seq += 1;
        ChatsRequest {
            seq: self.issued_chats_seq,
        }
    }

    /// Show a previously cached list until the first live one arrives.
    pub fn restore_chats(&mut self, cached: Vec<Chat>) {
        if self.applied_chats_seq == 0 {
            self.chats.replace(cached);
        }
    }

    /// Replace the chat list with a fresh one. Returns the request that opens
    /// a chat started from the contacts panel, if this list resolves it.
    pub fn apply_chats(
        &mut self,
        req: ChatsRequest,
        res: Result<Vec<Chat>, ApiError>,
    ) -> Option<MessagesRequest> {
        let chats = match res {
            Ok(chats) => chats,
            Err(err) => {
                log::error!("failed to load chats: {err}");
                if let Some(pending) = self.pending_open.take_if(|p| req.seq >= p.min_seq) {
                    log::warn!("not opening new chat with contact {}: reload failed", pending.contact_id);
                }
                return None;
            }
        };
        if req.seq < self.applied_chats_seq {
            log::debug!("dropping stale chat list #{} (have #{})", req.seq, self.applied_chats_seq);
            return None;
        }
        self.applied_chats_seq = req.seq;
        self.chats.replace(chats);

        let pending = self.pending_open.take_if(|p| req.seq >= p.min_seq)?;
        match self.chats.find_by_contact(pending.contact_id) {
            Some(chat) => {
                let (chat_id, contact) = (chat.id, chat.contact());
                Some(self.open_chat(chat_id, contact))
            }
            None => {
                log::warn!("new chat with contact {} missing from chat list", pending.contact_id);
                None
            }
        }
    }

    pub fn chat_list(&self) -> ChatListView {
        self.chats.render(self.open_chat_id())
    }

    pub fn chats(&self) -> &[Chat] {
        self.chats.chats()
    }

    /// Perform the action behind a chat-list entry or placeholder button.
    pub fn activate(&mut self, action: &ListAction) -> Option<MessagesRequest> {
        match action {
            ListAction::OpenChat { chat_id, contact } => Some(self.open_chat(*chat_id, contact.clone())),
            ListAction::NewChat => {
                self.open_contacts_panel();
                None
            }
        }
    }

    pub fn apply_contacts(&mut self, res: Result<Vec<Contact>, ApiError>) {
        match res {
            Ok(contacts) => self.contacts.replace(contacts),
            Err(err) => log::error!("failed to load contacts: {err}"),
        }
    }

    pub fn contact_list(&self) -> ContactListView {
        self.contacts.render()
    }

    pub fn open_contacts_panel(&mut self) {
        self.contacts_panel_open = true;
    }

    pub fn close_contacts_panel(&mut self) {
        self.contacts_panel_open = false;
    }

    pub fn contacts_panel_open(&self) -> bool {
        self.contacts_panel_open
    }

    pub fn start_new_chat(&self, contact: Contact) -> NewChatRequest {
        NewChatRequest { contact }
    }

    /// Handle the server's answer to a chat creation. On success the panel
    /// closes and the returned chat-list request, once applied, opens the chat.
    pub fn apply_new_chat(&mut self, req: NewChatRequest, res: Result<(), ApiError>) -> Option<ChatsRequest> {
        if let Err(err) = res {
            log::error!("failed to create chat with {}: {err}", req.contact.name);
            return None;
        }
        self.close_contacts_panel();
        let reload = self.load_chats();
        self.pending_open = Some(PendingOpen {
            contact_id: req.contact.id,
            min_seq: reload.seq,
        });
        Some(reload)
    }

    /// Open a chat. Also cancels any chat still waiting to be opened after
    /// its creation.
    pub fn open_chat(&mut self, chat_id: ChatId, contact: Contact) -> MessagesRequest {
        self.pending_open = None;
        let contact_id = contact.id;
        let token = self.session.open(chat_id, contact);
        self.thread.clear();
        MessagesRequest { token, contact_id }
    }

    pub fn current(&self) -> Option<&OpenChat> {
        self.session.current()
    }

    pub fn open_chat_id(&self) -> Option<ChatId> {
        self.session.current().map(|c| c.chat_id)
    }

    pub fn load_messages(&self) -> Option<MessagesRequest> {
        let token = self.session.token()?;
        let contact_id = self.session.current()?.contact.id;
        Some(MessagesRequest { token, contact_id })
    }

    pub fn apply_messages(&mut self, req: MessagesRequest, res: Result<Vec<Message>, ApiError>) {
        let messages = match res {
            Ok(messages) => messages,
            Err(err) => {
                log::error!("failed to load messages: {err}");
                return;
            }
        };
        if !self.session.is_current(req.token) {
            log::debug!("dropping messages for contact {}: chat no longer open", req.contact_id);
            return;
        }
        self.thread.replace(messages);
        self.request_scroll();
    }

    /// Same request as [`ChatView::load_messages`]; `None` while no chat is open.
    pub fn poll_messages(&self) -> Option<MessagesRequest> {
        self.load_messages()
    }

    /// Append unseen messages from a poll. Returns how many were appended.
    pub fn apply_poll(&mut self, req: MessagesRequest, res: Result<Vec<Message>, ApiError>) -> usize {
        let messages = match res {
            Ok(messages) => messages,
            Err(err) => {
                log::error!("failed to poll messages: {err}");
                return 0;
            }
        };
        if !self.session.is_current(req.token) {
            log::debug!("dropping poll for contact {}: chat no longer open", req.contact_id);
            return 0;
        }
        let appended = self.thread.append_new(messages);
        if appended > 0 {
            self.request_scroll();
        }
        appended
    }

    pub fn message_rows(&self) -> Vec<MessageRow> {
        let contact_name = self.current().map(|c| c.contact.name.as_str()).unwrap_or_default();
        self.thread.rows(contact_name)
    }

    pub fn thread_epoch(&self) -> u64 {
        self.thread.epoch()
    }

    pub fn set_composer(&mut self, text: &str) {
        if self.composer != text {
            self.composer = text.to_string();
        }
    }

    pub fn composer(&self) -> &str {
        &self.composer
    }

    /// `None` when the input is blank or no chat is open.
    pub fn submit_message(&self) -> Option<SendRequest> {
        if self.composer.trim().is_empty() {
            return None;
        }
        let token = self.session.token()?;
        let contact_id = self.session.current()?.contact.id;
        Some(SendRequest {
            token,
            contact_id,
            text: self.composer.clone(),
        })
    }

    /// Returns the chat-list refresh to issue after a successful send.
    pub fn apply_sent(&mut self, req: SendRequest, res: Result<Message, ApiError>) -> Option<ChatsRequest> {
        let message = match res {
            Ok(message) => message,
            Err(err) => {
                log::error!("failed to send message: {err}");
                return None;
            }
        };
        if self.session.is_current(req.token) {
            self.thread.push(message);
            self.composer.clear();
            self.request_scroll();
        } else {
            log::debug!("message {} sent to a chat that is no longer open", message.id);
            if self.composer == req.text {
                self.composer.clear();
            }
        }
        Some(self.load_chats())
    }

    fn request_scroll(&mut self) {
        self.scroll_requests += 1;
    }

    /// Number of scroll-to-bottom requests so far. A renderer scrolls whenever
    /// this moves past the value it last acted on.
    pub fn scroll_requests(&self) -> u64 {
        self.scroll_requests
    }
}
