//! Campus desk student portal.
//!
//! This crate wires the sign-in flow, the service dashboard and the chat
//! assistant into one `Portal`, configured from the environment and driven
//! by a line-oriented terminal surface.

pub mod app;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod terminal;
pub mod view;

pub use app::Portal;
pub use config::{ChatConfig, PortalConfig};
pub use error::PortalError;
pub use view::{ChatSurface, PortalView};
