pub mod actor;
pub mod collision;
pub mod controller;
pub mod geometry;
pub mod map;
pub mod player;
pub mod tile;
