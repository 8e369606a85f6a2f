//! Tools Module
//!
//! Each tool lives in its own module and exports a `register` function that
//! adds it to the server during initialization.

pub mod add;

use crate::core::registry::RegistryError;
use crate::core::server::McpServer;

/// Register every available tool.
///
/// Add new tool registrations here following this pattern:
/// `your_tool::register(server)?;`
pub fn register_all(server: &mut McpServer) -> Result<(), RegistryError> {
    add::register(server)?;
    Ok(())
}
