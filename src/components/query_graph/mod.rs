mod component;
mod highlight;
mod render;
mod state;
mod teardown;

pub use component::QueryGraphCanvas;
