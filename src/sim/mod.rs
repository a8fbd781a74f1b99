pub mod contact;
pub mod effects;
pub mod event;
pub mod exit;
pub mod input;
pub mod level;
pub mod player;
pub mod store;
pub mod world;
