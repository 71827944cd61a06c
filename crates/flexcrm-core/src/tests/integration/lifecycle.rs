#![cfg(test)]

use std::fs;
use std::sync::Arc;

use super::common::{TaskItem, setup_workspace, start_app, write_tasks_plugin};
use crate::plugin_system::error::PluginSystemError;
use crate::storage::entity::Entity;
use crate::storage::value::{Record, Value};

#[test]
fn test_tasks_plugin_enable_scenario() {
    let workspace = setup_workspace();
    let mut app = start_app(workspace.path());

    let descriptor = app.plugin_manager().descriptor("tasks").expect("tasks discovered").clone();
    assert_eq!(descriptor.name, "Tasks");
    assert_eq!(descriptor.version, "1.0");

    app.plugin_manager_mut().enable("tasks").expect("enable tasks");
    assert!(app.plugin_manager().is_enabled("tasks"));
    assert!(app.store().table_exists("tasks").unwrap());

    // Generic insert/select round trip on the plugin's table
    let mut row = Record::new();
    row.insert("title".to_string(), Value::Text("Follow up".to_string()));
    row.insert("status".to_string(), Value::Text("pending".to_string()));
    let id = app.store().insert("tasks", &row).unwrap();
    let rows = app
        .store()
        .select("tasks", Some("\"id\" = ?"), &[Value::Integer(id)], None)
        .unwrap();
    assert_eq!(rows[0].get("title"), Some(&Value::Text("Follow up".to_string())));

    app.shutdown().unwrap();
}

#[test]
fn test_undiscovered_but_enabled_scenario() {
    let workspace = setup_workspace();
    let state_file = workspace.path().join("plugins").join("enabled_plugins.json");
    fs::write(&state_file, r#"{"tasks": true}"#).unwrap();
    fs::remove_dir_all(workspace.path().join("plugins").join("tasks")).unwrap();

    let mut app = start_app(workspace.path());
    assert!(app.plugin_manager().is_enabled("tasks"));

    let err = app.plugin_manager_mut().enable("tasks").unwrap_err();
    assert!(matches!(err, PluginSystemError::UnknownPlugin(_)));
    assert!(err.to_string().contains("Unknown plugin id 'tasks'"));
    assert_eq!(fs::read_to_string(&state_file).unwrap(), r#"{"tasks": true}"#);
}

#[test]
fn test_enablement_survives_restart_and_activates_lazily() {
    let workspace = setup_workspace();

    let mut app = start_app(workspace.path());
    app.plugin_manager_mut().enable("tasks").unwrap();
    app.shutdown().unwrap();

    let mut app = start_app(workspace.path());
    let manager = app.plugin_manager_mut();
    assert!(manager.is_enabled("tasks"));
    assert!(manager.instance("tasks").is_none());

    let plugin = manager.activate("tasks").expect("lazy activation");
    assert_eq!(plugin.module_name(), "Tasks");
    assert!(Arc::ptr_eq(&plugin, &manager.instance("tasks").unwrap()));
}

#[test]
fn test_plugin_view_reflects_stored_entities() {
    let workspace = setup_workspace();
    let mut app = start_app(workspace.path());
    let plugin = app.plugin_manager_mut().enable("tasks").unwrap();

    TaskItem::new("Write report").save(app.store()).unwrap();
    TaskItem::new("Review contract").save(app.store()).unwrap();

    let view = plugin.render_ui(app.store()).unwrap();
    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.rows[0], vec!["Write report", "pending"]);
    let rendered = view.to_string();
    assert!(rendered.starts_with("✅ Tasks\n"));
    assert!(rendered.contains("Review contract | pending"));
}

#[test]
fn test_disable_then_rediscover_new_plugin() {
    let workspace = setup_workspace();
    let mut app = start_app(workspace.path());

    let first = app.plugin_manager_mut().enable("tasks").unwrap();
    app.plugin_manager_mut().disable("tasks").unwrap();
    assert!(!app.plugin_manager().is_enabled("tasks"));

    // Moving the plugin to a new directory is picked up by the next scan
    let plugins = workspace.path().join("plugins");
    fs::remove_dir_all(plugins.join("tasks")).unwrap();
    write_tasks_plugin(&plugins, "moved");
    let report = app.plugin_manager_mut().discover().unwrap();
    assert_eq!(report.discovered, vec!["tasks"]);

    let second = app.plugin_manager_mut().enable("tasks").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}
