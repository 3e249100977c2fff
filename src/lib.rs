pub mod backdrop;
pub mod canvas;
pub mod config;
pub mod director;
pub mod entities;
pub mod error;
pub mod particles;
pub mod projectiles;
pub mod snapshot;
pub mod sprites;
pub mod starfield;
