pub mod structs;

pub use structs::RenderCache;
