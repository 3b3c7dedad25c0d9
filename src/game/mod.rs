pub mod constants;
pub mod performance;
pub mod player;
pub mod spatial;
pub mod state;
pub mod systems;
pub mod trail;
