#![cfg(test)]

use super::common::{TaskItem, setup_workspace, start_app};
use crate::modules::clients::Client;
use crate::storage::entity::Entity;
use crate::storage::value::Value;

#[test]
fn test_builtin_and_plugin_entities_share_one_store() {
    let workspace = setup_workspace();
    let mut app = start_app(workspace.path());
    app.plugin_manager_mut().enable("tasks").unwrap();

    let mut client = Client::new("Initech").with_email("bill@initech.test");
    let client_id = client.save(app.store()).unwrap();
    let mut task = TaskItem::new("Send TPS report");
    let task_id = task.save(app.store()).unwrap();

    // Identities are per table
    assert_eq!(client_id, 1);
    assert_eq!(task_id, 1);

    assert_eq!(Client::get(app.store(), client_id).unwrap().unwrap().name, "Initech");
    assert_eq!(TaskItem::get(app.store(), task_id).unwrap().unwrap().title, "Send TPS report");
}

#[test]
fn test_entity_lifecycle_through_the_application_store() {
    let workspace = setup_workspace();
    let app = start_app(workspace.path());
    let store = app.store();

    let mut client = Client::new("Globex");
    let id = client.save(store).unwrap();
    let created = client.meta().created_at();

    client.status = "inactive".to_string();
    client.save(store).unwrap();

    let inactive =
        Client::get_all(store, Some("status = ?"), &[Value::Text("inactive".into())]).unwrap();
    assert_eq!(inactive.len(), 1);
    assert_eq!(inactive[0].id(), Some(id));
    assert_eq!(inactive[0].meta().created_at(), created);

    assert!(inactive[0].delete(store).unwrap());
    assert!(Client::get(store, id).unwrap().is_none());
}
