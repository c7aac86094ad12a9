pub mod events;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use events::SimulationEvent;
pub use scheduler::{TickPlan, TickScheduler};
pub use snapshot::{load_from_file, load_state, save_to_file, save_to_json, SaveData, SAVE_VERSION};
pub use state::SimulationState;
pub use tick::{run_fast_tick, run_slow_tick, Simulation, TickSubscriber};
