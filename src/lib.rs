pub mod color;
pub mod config;
pub mod geo;
pub mod noise;
pub mod region;
pub mod score;
pub mod solar;
pub mod sun;
pub mod sync;
pub mod tiles;
pub mod web;

pub use config::AppConfig;
pub use region::Region;
pub use score::{score_location, ScoreResult, ScoreSource};
pub use sync::{MapFrame, MapSync, ViewState};
pub use tiles::{generate_tiles, Tile};
