pub mod chat_view;
pub mod contacts_panel;
pub mod login;
pub mod main_window;
pub mod poller;
pub mod sidebar;
