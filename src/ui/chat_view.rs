use std::cell::Cell;

use gtk4 as gtk;
use gtk4::prelude::*;

use crate::api::models::Contact;
use crate::model::{Direction, MessageRow};

/// What the conversation pane needs from the view model for one render.
pub struct ThreadFrame {
    pub contact: Option<Contact>,
    pub epoch: u64,
    pub rows: Vec<MessageRow>,
    pub composer: String,
    pub scroll_requests: u64,
}

pub struct ChatPane {
    stack: gtk::Stack,
    name: gtk::Label,
    phone: gtk::Label,
    scroller: gtk::ScrolledWindow,
    messages_box: gtk::Box,
    entry: gtk::Entry,
    rendered_epoch: Cell<Option<u64>>,
    rendered_len: Cell<usize>,
    seen_scrolls: Cell<u64>,
}

impl ChatPane {
    pub fn new<S, E>(on_send: S, on_edit: E) -> Self
    where
        S: Fn() + 'static,
        E: Fn(String) + 'static,
    {
        let stack = gtk::Stack::new();
        stack.set_hexpand(true);
        stack.set_vexpand(true);

        let empty = adw::StatusPage::builder()
            .icon_name("chat-message-new-symbolic")
            .title("No chat selected")
            .description("Select a chat or start a new one.")
            .build();
        stack.add_named(&empty, Some("empty"));

        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);

        let header = gtk::Box::new(gtk::Orientation::Vertical, 2);
        let name = gtk::Label::new(None);
        name.add_css_class("title-3");
        name.set_halign(gtk::Align::Start);
        let phone = gtk::Label::new(None);
        phone.add_css_class("dim-label");
        phone.set_halign(gtk::Align::Start);
        header.append(&name);
        header.append(&phone);
        root.append(&header);

        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hexpand(true)
            .hscrollbar_policy(gtk::PolicyType::Never)
            .build();
        let messages_box = gtk::Box::new(gtk::Orientation::Vertical, 6);
        scroller.set_child(Some(&messages_box));
        root.append(&scroller);

        // Input row
        let input_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let entry = gtk::Entry::new();
        entry.set_hexpand(true);
        entry.set_placeholder_text(Some("Type a message…"));
        let send_btn = gtk::Button::with_label("Send");
        send_btn.add_css_class("suggested-action");
        input_row.append(&entry);
        input_row.append(&send_btn);
        root.append(&input_row);
        stack.add_named(&root, Some("chat"));
        stack.set_visible_child_name("empty");

        entry.connect_changed(move |e| on_edit(e.text().to_string()));
        {
            use std::rc::Rc;
            let send: Rc<dyn Fn()> = Rc::new(on_send);
            {
                let send = send.clone();
                send_btn.connect_clicked(move |_| (send)());
            }
            entry.connect_activate(move |_| (send)());
        }

        Self {
            stack,
            name,
            phone,
            scroller,
            messages_box,
            entry,
            rendered_epoch: Cell::new(None),
            rendered_len: Cell::new(0),
            seen_scrolls: Cell::new(0),
        }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.stack.clone().upcast()
    }

    pub fn render(&self, frame: ThreadFrame) {
        match &frame.contact {
            Some(contact) => {
                self.stack.set_visible_child_name("chat");
                self.name.set_label(&contact.name);
                self.phone.set_label(&contact.phone);
            }
            None => self.stack.set_visible_child_name("empty"),
        }

        // The thread is append-only within an epoch, so only the tail is new.
        if self.rendered_epoch.get() != Some(frame.epoch) {
            while let Some(child) = self.messages_box.first_child() {
                self.messages_box.remove(&child);
            }
            self.rendered_epoch.set(Some(frame.epoch));
            self.rendered_len.set(0);
        }
        for row in frame.rows.iter().skip(self.rendered_len.get()) {
            self.messages_box.append(&message_widget(row));
        }
        self.rendered_len.set(frame.rows.len());

        if self.entry.text().as_str() != frame.composer {
            self.entry.set_text(&frame.composer);
        }

        if frame.scroll_requests != self.seen_scrolls.get() {
            self.seen_scrolls.set(frame.scroll_requests);
            self.scroll_to_bottom();
        }
    }

    fn scroll_to_bottom(&self) {
        // Wait for layout so the adjustment knows about the new rows.
        let adj = self.scroller.vadjustment();
        glib::idle_add_local_once(move || {
            adj.set_value(adj.upper() - adj.page_size());
        });
    }
}

fn message_widget(row: &MessageRow) -> gtk::Widget {
    let bubble = gtk::Box::new(gtk::Orientation::Vertical, 2);
    bubble.add_css_class("card");
    bubble.set_margin_start(6);
    bubble.set_margin_end(6);
    let (align, class) = match row.direction {
        Direction::Received => (gtk::Align::Start, "received"),
        Direction::Sent => (gtk::Align::End, "sent"),
    };
    bubble.set_halign(align);
    bubble.add_css_class(class);

    let text = gtk::Label::new(Some(&row.text));
    text.set_wrap(true);
    text.set_selectable(true);
    text.set_xalign(0.0);
    text.set_margin_top(6);
    text.set_margin_start(10);
    text.set_margin_end(10);
    bubble.append(&text);

    let time = gtk::Label::new(Some(&row.time));
    time.add_css_class("caption");
    time.add_css_class("dim-label");
    time.set_halign(gtk::Align::End);
    time.set_margin_bottom(4);
    time.set_margin_end(10);
    bubble.append(&time);
    bubble.upcast()
}
