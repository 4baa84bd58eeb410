pub mod commands;

pub use commands::{export, render_devices, run};
