pub mod buffer;
pub mod camera;
pub mod core;
pub mod mesh;
pub mod scene;
pub mod shaders;
pub mod systems;
