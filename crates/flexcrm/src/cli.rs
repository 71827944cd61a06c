use flexcrm_core::kernel::bootstrap::Application;
use flexcrm_core::kernel::error::Result;
use flexcrm_core::modules::clients::Client;
use flexcrm_core::storage::Entity;

/// Print every discovered plugin with its enablement and load state.
pub fn list_plugins(app: &Application) {
    let manager = app.plugin_manager();
    let mut any = false;
    for descriptor in manager.descriptors() {
        any = true;
        let state = if manager.is_enabled(&descriptor.id) {
            "enabled"
        } else {
            "disabled"
        };
        println!(
            "{} {} ({} v{}) [{}]",
            descriptor.display_icon(),
            descriptor.id,
            descriptor.name,
            descriptor.version,
            state
        );
    }
    if !any {
        println!("No plugins discovered in {}", manager.registry().root().display());
    }
}

/// Activate `id` and print the view it renders.
pub fn show_plugin(app: &mut Application, id: &str) -> Result<()> {
    let plugin = app.plugin_manager_mut().activate(id)?;
    let view = plugin.render_ui(app.store())?;
    print!("{}", view);
    Ok(())
}

pub fn enable_plugin(app: &mut Application, id: &str) -> Result<()> {
    let plugin = app.plugin_manager_mut().enable(id)?;
    println!("Enabled plugin '{}' ({})", id, plugin.module_name());
    Ok(())
}

pub fn disable_plugin(app: &mut Application, id: &str) -> Result<()> {
    app.plugin_manager_mut().disable(id)?;
    println!("Disabled plugin '{}'", id);
    Ok(())
}

pub fn reload_plugin(app: &mut Application, id: &str) -> Result<()> {
    app.plugin_manager_mut().reload(id)?;
    println!("Reloaded plugin '{}'", id);
    Ok(())
}

/// Fields accepted by `client add`
#[derive(Debug, Default)]
pub struct NewClient {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
}

pub fn add_client(app: &Application, input: NewClient) -> Result<()> {
    let mut client = Client::new(input.name);
    client.email = input.email;
    client.phone = input.phone;
    client.company = input.company;
    client.notes = input.notes;
    let id = client.save(app.store())?;
    println!("Added client #{}: {}", id, client.name);
    Ok(())
}

pub fn list_clients(app: &Application) -> Result<()> {
    let clients = Client::get_all(app.store(), None, &[])?;
    if clients.is_empty() {
        println!("No clients");
        return Ok(());
    }
    for client in clients {
        println!(
            "#{} {} <{}> {} [{}]",
            client.id().unwrap_or_default(),
            client.name,
            client.email.as_deref().unwrap_or("-"),
            client.company.as_deref().unwrap_or("-"),
            client.status
        );
    }
    Ok(())
}

/// Delete client `id`. Returns `false` when no such client exists.
pub fn delete_client(app: &Application, id: i64) -> Result<bool> {
    match Client::get(app.store(), id)? {
        Some(client) => {
            client.delete(app.store())?;
            println!("Deleted client #{}", id);
            Ok(true)
        }
        None => {
            eprintln!("No client with id {}", id);
            Ok(false)
        }
    }
}
