//! Fleetdash desktop host.
//!
//! Concrete collaborators the export engine needs outside a browser:
//! [`DesktopHost`] saves artifacts into a directory and prints through a
//! spooler command, and [`ImageFileRenderer`] reads snapshot surfaces from
//! image files.

pub mod desktop;
pub mod surface;

pub use desktop::DesktopHost;
pub use surface::ImageFileRenderer;
