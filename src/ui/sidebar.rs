use std::cell::RefCell;
use std::rc::Rc;

use gtk4 as gtk;
use gtk4::prelude::*;

use crate::model::{ChatListEntry, ChatListView, ChatRow, ListAction};

/// Conversation list. Every render rebuilds the rows from scratch; the
/// action for row `i` lives at `actions[i]`.
pub struct Sidebar {
    root: gtk::Box,
    list: gtk::ListBox,
    placeholder: gtk::Box,
    loading: gtk::Spinner,
    actions: Rc<RefCell<Vec<ListAction>>>,
}

impl Sidebar {
    pub fn new<F>(on_action: F) -> Self
    where
        F: Fn(ListAction) + 'static,
    {
        let on_action = Rc::new(on_action);
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);
        root.set_width_request(280);

        let title = gtk::Label::new(Some("Chats"));
        title.add_css_class("heading");
        title.set_halign(gtk::Align::Start);
        root.append(&title);

        let loading = gtk::Spinner::new();
        loading.set_spinning(true);
        root.append(&loading);

        let placeholder = gtk::Box::new(gtk::Orientation::Vertical, 8);
        placeholder.set_valign(gtk::Align::Center);
        placeholder.set_vexpand(true);
        let hint = gtk::Label::new(Some("No chats yet. Start a new conversation!"));
        hint.set_wrap(true);
        hint.add_css_class("dim-label");
        placeholder.append(&hint);
        let new_chat_btn = gtk::Button::with_label("New Chat");
        new_chat_btn.add_css_class("suggested-action");
        new_chat_btn.set_halign(gtk::Align::Center);
        {
            let on_action = on_action.clone();
            new_chat_btn.connect_clicked(move |_| on_action(ListAction::NewChat));
        }
        placeholder.append(&new_chat_btn);
        placeholder.set_visible(false);
        root.append(&placeholder);

        let list = gtk::ListBox::new();
        list.set_selection_mode(gtk::SelectionMode::Single);
        list.add_css_class("navigation-sidebar");
        let actions: Rc<RefCell<Vec<ListAction>>> = Rc::new(RefCell::new(Vec::new()));
        {
            let actions = actions.clone();
            list.connect_row_activated(move |_, row| {
                let action = usize::try_from(row.index())
                    .ok()
                    .and_then(|idx| actions.borrow().get(idx).cloned());
                if let Some(action) = action {
                    on_action(action);
                }
            });
        }
        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hscrollbar_policy(gtk::PolicyType::Never)
            .child(&list)
            .build();
        root.append(&scroller);

        Self {
            root,
            list,
            placeholder,
            loading,
            actions,
        }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn render(&self, view: ChatListView) {
        while let Some(child) = self.list.first_child() {
            self.list.remove(&child);
        }
        self.actions.borrow_mut().clear();

        self.loading.set_visible(matches!(view, ChatListView::Loading));
        self.placeholder.set_visible(matches!(view, ChatListView::Empty));
        let ChatListView::Entries(entries) = view else {
            return;
        };

        for entry in entries {
            let row = gtk::ListBoxRow::new();
            match &entry {
                ChatListEntry::Chat(chat) => row.set_child(Some(&chat_row(chat))),
                ChatListEntry::NewChat => row.set_child(Some(&new_chat_row())),
            }
            self.list.append(&row);
            if let ChatListEntry::Chat(chat) = &entry {
                if chat.active {
                    row.add_css_class("active");
                    self.list.select_row(Some(&row));
                }
            }
            self.actions.borrow_mut().push(entry.action());
        }
    }
}

fn avatar(text: &str) -> gtk::Label {
    let avatar = gtk::Label::new(Some(text));
    avatar.add_css_class("title-3");
    avatar.set_width_chars(2);
    avatar
}

fn chat_row(chat: &ChatRow) -> gtk::Widget {
    let row = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    row.set_margin_top(6);
    row.set_margin_bottom(6);
    row.append(&avatar(&chat.avatar));

    let info = gtk::Box::new(gtk::Orientation::Vertical, 2);
    info.set_hexpand(true);
    let name = gtk::Label::new(Some(&chat.contact.name));
    name.add_css_class("heading");
    name.set_halign(gtk::Align::Start);
    info.append(&name);
    let preview = gtk::Label::new(Some(&chat.preview));
    preview.add_css_class("dim-label");
    preview.set_halign(gtk::Align::Start);
    preview.set_ellipsize(gtk::pango::EllipsizeMode::End);
    info.append(&preview);
    row.append(&info);

    let time = gtk::Label::new(Some(&chat.time));
    time.add_css_class("caption");
    time.set_valign(gtk::Align::Start);
    row.append(&time);
    row.upcast()
}

fn new_chat_row() -> gtk::Widget {
    let row = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    row.set_margin_top(6);
    row.set_margin_bottom(6);
    row.append(&avatar("+"));
    let name = gtk::Label::new(Some("New Chat"));
    name.set_halign(gtk::Align::Start);
    row.append(&name);
    row.upcast()
}
