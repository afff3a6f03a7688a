pub mod assets;
pub mod event;
pub mod level;
pub mod props;
pub mod step;
pub mod world;
