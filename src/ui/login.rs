use adw::prelude::*;
use adw::Application;
use gtk4 as gtk;

use crate::api::{ApiClient, ApiError};
use crate::app::AppState;

pub fn show_login_window(app: &Application, state: AppState) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Log In")
        .default_width(420)
        .default_height(300)
        .resizable(false)
        .build();

    let toast_overlay = adw::ToastOverlay::new();

    // Root container
    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(24);
    root.set_margin_bottom(24);
    root.set_margin_start(24);
    root.set_margin_end(24);

    let title = gtk::Label::new(Some("Connect to a chat server"));
    title.add_css_class("title-2");
    title.set_halign(gtk::Align::Start);
    root.append(&title);

    let server_entry = gtk::Entry::new();
    server_entry.set_placeholder_text(Some("Server URL (e.g. http://localhost:5000)"));
    server_entry.set_text(&state.server_url);
    server_entry.set_hexpand(true);

    let name_entry = gtk::Entry::new();
    name_entry.set_placeholder_text(Some("Your name"));
    name_entry.set_text(&state.name);

    let phone_entry = gtk::Entry::new();
    phone_entry.set_placeholder_text(Some("Phone number"));
    phone_entry.set_input_purpose(gtk::InputPurpose::Phone);
    phone_entry.set_text(&state.phone);

    let form = gtk::Box::new(gtk::Orientation::Vertical, 8);
    form.append(&server_entry);
    form.append(&name_entry);
    form.append(&phone_entry);
    root.append(&form);

    // Status label (small, muted)
    let status = gtk::Label::new(None);
    status.add_css_class("dim-label");
    status.set_halign(gtk::Align::Start);
    root.append(&status);

    let login_btn = gtk::Button::with_label("Log In");
    login_btn.add_css_class("suggested-action");
    login_btn.set_halign(gtk::Align::End);
    root.append(&login_btn);

    toast_overlay.set_child(Some(&root));
    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let header_title = gtk::Label::new(Some("Chats"));
    header.set_title_widget(Some(&header_title));
    container.append(&header);
    container.append(&toast_overlay);
    window.set_content(Some(&container));

    let on_connect = {
        let app = app.clone();
        let window = window.clone();
        let overlay = toast_overlay.clone();
        let server_entry = server_entry.clone();
        let name_entry = name_entry.clone();
        let phone_entry = phone_entry.clone();
        let login_btn = login_btn.clone();
        move || {
            let url = crate::utils::normalize_url(&server_entry.text());
            let name = name_entry.text().trim().to_string();
            let phone = phone_entry.text().trim().to_string();
            if url.is_empty() || name.is_empty() || phone.is_empty() {
                overlay.add_toast(adw::Toast::new("Server URL, name and phone are required."));
                return;
            }
            let api = match ApiClient::new(&url) {
                Ok(api) => api,
                Err(err) => {
                    overlay.add_toast(adw::Toast::new(&format!("Invalid server URL: {err}")));
                    return;
                }
            };

            status.set_label("Connecting…");
            login_btn.set_sensitive(false);

            let client = api.clone();
            let (name_for_login, phone_for_login) = (name.clone(), phone.clone());
            let status_label = status.clone();
            let app2 = app.clone();
            let window2 = window.clone();
            let overlay2 = overlay.clone();
            let login_btn2 = login_btn.clone();
            let mut st = state.clone();
            crate::utils::run_async_to_main(
                async move { client.login(&name_for_login, &phone_for_login).await },
                move |res: Result<(), ApiError>| {
                    login_btn2.set_sensitive(true);
                    match res {
                        Ok(()) => {
                            status_label.set_label("Connected");
                            st.server_url = url;
                            st.name = name;
                            st.phone = phone;
                            if let Err(e) = st.save() {
                                log::error!("failed to save settings: {e}");
                                overlay2.add_toast(adw::Toast::new(&format!("Failed to save settings: {}", e)));
                            }
                            crate::ui::main_window::show_logged_in(&app2, st, api);
                            window2.close();
                        }
                        Err(err) => {
                            log::error!("login failed: {err}");
                            status_label.set_label("Login failed");
                            overlay2.add_toast(adw::Toast::new(&format!("Could not log in: {err}")));
                        }
                    }
                },
            );
        }
    };

    use std::rc::Rc;
    let on_connect: Rc<dyn Fn()> = Rc::new(on_connect);
    // Button click
    {
        let on_connect = on_connect.clone();
        login_btn.connect_clicked(move |_| (on_connect)());
    }
    // Enter in any field triggers login
    for entry in [&server_entry, &name_entry, &phone_entry] {
        let on_connect = on_connect.clone();
        entry.connect_activate(move |_| (on_connect)());
    }

    window.present();
}
