use std::cell::RefCell;
use std::rc::{Rc, Weak};

use adw::Application;
use adw::prelude::*;

use crate::api::ApiClient;
use crate::api::models::Contact;
use crate::app::AppState;
use crate::model::{ChatListView, ChatView, ChatsRequest, ContactListView, ListAction, MessagesRequest};
use crate::storage::ChatCache;
use crate::ui::chat_view::{ChatPane, ThreadFrame};
use crate::ui::contacts_panel::ContactsPanel;
use crate::ui::poller::Poller;
use crate::ui::sidebar::Sidebar;
use crate::utils::run_async_to_main;

/// Open the main window for a stored identity, logging in first. A failed
/// login sends the user back to the login window.
pub fn show_main_window(app: &Application, state: AppState) {
    let api = match ApiClient::new(&state.server_url) {
        Ok(api) => api,
        Err(err) => {
            log::error!("stored server url {:?} is unusable: {err}", state.server_url);
            crate::ui::login::show_login_window(app, state);
            return;
        }
    };
    // No window is open while the login is in flight.
    let hold = app.hold();
    let app = app.clone();
    let (name, phone) = (state.name.clone(), state.phone.clone());
    let client = api.clone();
    run_async_to_main(async move { client.login(&name, &phone).await }, move |res| {
        match res {
            Ok(()) => show_logged_in(&app, state, api),
            Err(err) => {
                log::error!("automatic login failed: {err}");
                crate::ui::login::show_login_window(&app, state);
            }
        }
        drop(hold);
    });
}

/// Open the main window with a client that already holds a session.
pub fn show_logged_in(app: &Application, state: AppState, api: ApiClient) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Chats")
        .default_width(960)
        .default_height(640)
        .build();

    let main = MainWindow::new(app, &window, state, api);

    let container = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let title = gtk4::Label::new(Some(&main.state.name));
    header.set_title_widget(Some(&title));

    let new_chat_btn = gtk4::Button::with_label("New Chat");
    new_chat_btn.add_css_class("suggested-action");
    {
        let main = Rc::downgrade(&main);
        new_chat_btn.connect_clicked(move |_| {
            if let Some(main) = main.upgrade() {
                main.activate(ListAction::NewChat);
            }
        });
    }
    header.pack_end(&new_chat_btn);

    let logout_btn = gtk4::Button::with_label("Log Out");
    {
        let main = Rc::downgrade(&main);
        logout_btn.connect_clicked(move |_| {
            if let Some(main) = main.upgrade() {
                main.logout();
            }
        });
    }
    header.pack_start(&logout_btn);

    let body = gtk4::Box::new(gtk4::Orientation::Horizontal, 0);
    body.append(&main.sidebar.widget());
    body.append(&gtk4::Separator::new(gtk4::Orientation::Vertical));
    body.append(&main.pane.widget());
    body.append(&main.contacts.widget());

    container.append(&header);
    container.append(&body);
    window.set_content(Some(&container));

    // The window owns the controller; everything else only holds weak refs.
    let owner = RefCell::new(Some(main.clone()));
    window.connect_destroy(move |_| {
        if let Some(main) = owner.borrow_mut().take() {
            main.poller.borrow_mut().stop();
        }
    });
    window.present();

    main.start();
}

pub struct MainWindow {
    app: Application,
    window: adw::ApplicationWindow,
    state: AppState,
    api: ApiClient,
    cache: Option<ChatCache>,
    view: RefCell<ChatView>,
    sidebar: Sidebar,
    pane: ChatPane,
    contacts: ContactsPanel,
    poller: RefCell<Poller>,
    shown_chats: RefCell<Option<ChatListView>>,
    shown_contacts: RefCell<Option<ContactListView>>,
}

impl MainWindow {
    fn new(app: &Application, window: &adw::ApplicationWindow, state: AppState, api: ApiClient) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Self>| {
            let sidebar = Sidebar::new(with(weak, |main, action: ListAction| main.activate(action)));
            let pane = ChatPane::new(
                {
                    let weak = weak.clone();
                    move || {
                        if let Some(main) = weak.upgrade() {
                            main.submit();
                        }
                    }
                },
                with(weak, |main, text: String| main.view.borrow_mut().set_composer(&text)),
            );
            let contacts = ContactsPanel::new(with(weak, |main, contact: Contact| main.start_new_chat(contact)), {
                let weak = weak.clone();
                move || {
                    if let Some(main) = weak.upgrade() {
                        main.view.borrow_mut().close_contacts_panel();
                        main.render();
                    }
                }
            });
            let poller = Poller::new(state.poll_interval());
            let cache = ChatCache::for_identity(&state.server_url, &state.phone);
            Self {
                app: app.clone(),
                window: window.clone(),
                state,
                api,
                cache,
                view: RefCell::new(ChatView::new()),
                sidebar,
                pane,
                contacts,
                poller: RefCell::new(poller),
                shown_chats: RefCell::new(None),
                shown_contacts: RefCell::new(None),
            }
        })
    }

    fn start(self: &Rc<Self>) {
        if let Some(cache) = &self.cache {
            match cache.init().and_then(|_| cache.chats(Some(200))) {
                Ok(cached) if !cached.is_empty() => self.view.borrow_mut().restore_chats(cached),
                Ok(_) => {}
                Err(err) => log::warn!("chat cache {} unavailable: {err}", cache.path().display()),
            }
        }
        self.render();

        let req = self.view.borrow_mut().load_chats();
        self.fetch_chats(req);
        self.fetch_contacts();

        let weak = Rc::downgrade(self);
        self.poller.borrow_mut().start(move || {
            if let Some(main) = weak.upgrade() {
                main.poll();
            }
        });
    }

    fn fetch_chats(self: &Rc<Self>, req: ChatsRequest) {
        let api = self.api.clone();
        let weak = Rc::downgrade(self);
        run_async_to_main(async move { api.chats().await }, move |res| {
            let Some(main) = weak.upgrade() else { return };
            let fetched = res.is_ok();
            let open = main.view.borrow_mut().apply_chats(req, res);
            if fetched {
                main.store_chats();
            }
            if let Some(open) = open {
                main.fetch_messages(open);
            }
            main.render();
        });
    }

    fn store_chats(&self) {
        let Some(cache) = &self.cache else { return };
        let view = self.view.borrow();
        if let Err(err) = cache.replace_chats(view.chats()) {
            log::warn!("could not cache chat list: {err}");
        }
    }

    fn fetch_contacts(self: &Rc<Self>) {
        let api = self.api.clone();
        let weak = Rc::downgrade(self);
        run_async_to_main(async move { api.contacts().await }, move |res| {
            let Some(main) = weak.upgrade() else { return };
            main.view.borrow_mut().apply_contacts(res);
            main.render();
        });
    }

    fn activate(self: &Rc<Self>, action: ListAction) {
        let open = self.view.borrow_mut().activate(&action);
        if let Some(req) = open {
            self.fetch_messages(req);
        }
        self.render();
    }

    fn fetch_messages(self: &Rc<Self>, req: MessagesRequest) {
        let api = self.api.clone();
        let weak = Rc::downgrade(self);
        run_async_to_main(async move { api.messages(req.contact_id).await }, move |res| {
            let Some(main) = weak.upgrade() else { return };
            main.view.borrow_mut().apply_messages(req, res);
            main.render();
        });
    }

    fn poll(self: &Rc<Self>) {
        let Some(req) = self.view.borrow().poll_messages() else {
            return;
        };
        let api = self.api.clone();
        let weak = Rc::downgrade(self);
        run_async_to_main(async move { api.messages(req.contact_id).await }, move |res| {
            let Some(main) = weak.upgrade() else { return };
            if main.view.borrow_mut().apply_poll(req, res) > 0 {
                main.render();
            }
        });
    }

    fn submit(self: &Rc<Self>) {
        let Some(req) = self.view.borrow().submit_message() else {
            return;
        };
        let api = self.api.clone();
        let weak = Rc::downgrade(self);
        let (contact_id, text) = (req.contact_id, req.text.clone());
        run_async_to_main(async move { api.send_message(contact_id, &text).await }, move |res| {
            let Some(main) = weak.upgrade() else { return };
            let reload = main.view.borrow_mut().apply_sent(req, res);
            if let Some(reload) = reload {
                main.fetch_chats(reload);
            }
            main.render();
        });
    }

    fn start_new_chat(self: &Rc<Self>, contact: Contact) {
        let req = self.view.borrow().start_new_chat(contact);
        let api = self.api.clone();
        let weak = Rc::downgrade(self);
        let contact_id = req.contact.id;
        run_async_to_main(async move { api.create_chat(contact_id).await }, move |res| {
            let Some(main) = weak.upgrade() else { return };
            let reload = main.view.borrow_mut().apply_new_chat(req, res);
            if let Some(reload) = reload {
                main.fetch_chats(reload);
            }
            main.render();
        });
    }

    fn logout(self: &Rc<Self>) {
        self.poller.borrow_mut().stop();
        let api = self.api.clone();
        crate::utils::spawn_async(async move {
            if let Err(err) = api.logout().await {
                log::warn!("logout request failed: {err}");
            }
        });
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.replace_chats(&[]) {
                log::warn!("could not clear chat cache: {err}");
            }
        }
        let mut state = self.state.clone();
        state.forget_identity();
        if let Err(err) = state.save() {
            log::error!("could not save config: {err}");
        }
        crate::ui::login::show_login_window(&self.app, state);
        self.window.close();
    }

    /// Push the view model's current state into the widgets.
    fn render(&self) {
        let (chats, contacts, panel_open, frame) = {
            let view = self.view.borrow();
            let frame = ThreadFrame {
                contact: view.current().map(|c| c.contact.clone()),
                epoch: view.thread_epoch(),
                rows: view.message_rows(),
                composer: view.composer().to_string(),
                scroll_requests: view.scroll_requests(),
            };
            (view.chat_list(), view.contact_list(), view.contacts_panel_open(), frame)
        };

        if self.shown_chats.borrow().as_ref() != Some(&chats) {
            self.sidebar.render(chats.clone());
            *self.shown_chats.borrow_mut() = Some(chats);
        }
        if self.shown_contacts.borrow().as_ref() != Some(&contacts) {
            self.contacts.render(contacts.clone());
            *self.shown_contacts.borrow_mut() = Some(contacts);
        }
        self.contacts.set_open(panel_open);
        self.pane.render(frame);
    }
}

/// Adapt a method-style callback to a widget callback holding a weak
/// reference to the window.
fn with<T, F>(weak: &Weak<MainWindow>, f: F) -> impl Fn(T) + 'static
where
    T: 'static,
    F: Fn(&Rc<MainWindow>, T) + 'static,
{
    let weak = weak.clone();
    move |arg| {
        if let Some(main) = weak.upgrade() {
            f(&main, arg);
        }
    }
}
