use std::cell::RefCell;
use std::rc::Rc;

use gtk4 as gtk;
use gtk4::prelude::*;

use crate::api::models::Contact;
use crate::model::ContactListView;

/// Side panel listing everyone the user can start a chat with.
pub struct ContactsPanel {
    root: gtk::Box,
    list: gtk::ListBox,
    placeholder: gtk::Label,
    contacts: Rc<RefCell<Vec<Contact>>>,
}

impl ContactsPanel {
    pub fn new<P, C>(on_pick: P, on_close: C) -> Self
    where
        P: Fn(Contact) + 'static,
        C: Fn() + 'static,
    {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);
        root.set_width_request(240);

        let header = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let title = gtk::Label::new(Some("Contacts"));
        title.add_css_class("heading");
        title.set_halign(gtk::Align::Start);
        title.set_hexpand(true);
        header.append(&title);
        let close_btn = gtk::Button::from_icon_name("window-close-symbolic");
        close_btn.add_css_class("flat");
        close_btn.connect_clicked(move |_| on_close());
        header.append(&close_btn);
        root.append(&header);

        let placeholder = gtk::Label::new(Some("Loading contacts…"));
        placeholder.add_css_class("dim-label");
        root.append(&placeholder);

        let list = gtk::ListBox::new();
        list.set_selection_mode(gtk::SelectionMode::None);
        list.add_css_class("navigation-sidebar");
        let contacts: Rc<RefCell<Vec<Contact>>> = Rc::new(RefCell::new(Vec::new()));
        {
            let contacts = contacts.clone();
            list.connect_row_activated(move |_, row| {
                let picked = usize::try_from(row.index())
                    .ok()
                    .and_then(|idx| contacts.borrow().get(idx).cloned());
                if let Some(contact) = picked {
                    on_pick(contact);
                }
            });
        }
        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hscrollbar_policy(gtk::PolicyType::Never)
            .child(&list)
            .build();
        root.append(&scroller);
        root.set_visible(false);

        Self {
            root,
            list,
            placeholder,
            contacts,
        }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn set_open(&self, open: bool) {
        if self.root.is_visible() != open {
            self.root.set_visible(open);
        }
    }

    pub fn render(&self, view: ContactListView) {
        while let Some(child) = self.list.first_child() {
            self.list.remove(&child);
        }
        self.contacts.borrow_mut().clear();

        let rows = match view {
            ContactListView::Loading => {
                self.placeholder.set_label("Loading contacts…");
                self.placeholder.set_visible(true);
                return;
            }
            ContactListView::Empty => {
                self.placeholder.set_label("No contacts available");
                self.placeholder.set_visible(true);
                return;
            }
            ContactListView::Entries(rows) => rows,
        };
        self.placeholder.set_visible(false);

        for entry in rows {
            let row_box = gtk::Box::new(gtk::Orientation::Horizontal, 8);
            row_box.set_margin_top(6);
            row_box.set_margin_bottom(6);
            let avatar = gtk::Label::new(Some(&entry.avatar));
            avatar.add_css_class("title-4");
            avatar.set_width_chars(2);
            row_box.append(&avatar);
            let name = gtk::Label::new(Some(&entry.contact.name));
            name.set_halign(gtk::Align::Start);
            name.set_tooltip_text(Some(&entry.contact.phone));
            row_box.append(&name);

            let row = gtk::ListBoxRow::new();
            row.set_child(Some(&row_box));
            self.list.append(&row);
            self.contacts.borrow_mut().push(entry.contact);
        }
    }
}
