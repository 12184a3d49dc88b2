use crate::api::models::{Contact, ContactId};
use crate::utils::avatar_initial;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRow {
    pub key: ContactId,
    pub avatar: String,
    pub contact: Contact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactListView {
    Loading,
    Empty,
    Entries(Vec<ContactRow>),
}

#[derive(Debug, Default)]
pub struct ContactList {
    contacts: Option<Vec<Contact>>,
}

impl ContactList {
    pub fn replace(&mut self, contacts: Vec<Contact>) {
        self.contacts = Some(contacts);
    }

    pub fn render(&self) -> ContactListView {
        match &self.contacts {
            None => ContactListView::Loading,
            Some(contacts) if contacts.is_empty() => ContactListView::Empty,
            Some(contacts) => ContactListView::Entries(
                contacts
                    .iter()
                    .map(|c| ContactRow {
                        key: c.id,
                        avatar: avatar_initial(&c.name),
                        contact: c.clone(),
                    })
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_placeholder_for_empty_list() {
        let mut list = ContactList::default();
        assert_eq!(list.render(), ContactListView::Loading);
        list.replace(Vec::new());
        assert_eq!(list.render(), ContactListView::Empty);
    }

    #[test]
    fn rows_are_keyed_by_contact_id() {
        let mut list = ContactList::default();
        list.replace(vec![Contact {
            id: 4,
            name: "bob".to_string(),
            phone: "555-0004".to_string(),
        }]);
        let ContactListView::Entries(rows) = list.render() else {
            panic!("expected entries");
        };
        assert_eq!(rows[0].key, 4);
        assert_eq!(rows[0].avatar, "b");
    }
}
