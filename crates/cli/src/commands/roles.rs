//! `vimai roles`: List selectable roles.

use vimai_config::Settings;
use vimai_core::CommandType;

pub fn run(settings: &Settings, command_type: CommandType) -> Result<(), Box<dyn std::error::Error>> {
    let names = settings.role_store().list_role_names(command_type)?;
    for name in names {
        println!("{name}");
    }
    Ok(())
}
