pub mod class;
pub mod constants;
pub mod events;
pub mod game_loop;
pub mod match_result;
pub mod performance;
pub mod reinforcement;
pub mod spatial;
pub mod spawner;
pub mod state;
pub mod systems;
