pub mod asset;
pub mod player;

pub use asset::AssetRef;
pub use player::Player;
