//! Block field simulation
//!
//! Pure and display-free:
//! - Time comes in as an explicit frame delta
//! - Randomness comes from a seeded RNG owned by the state
//! - Blocks live in a flat arena, sorted back-to-front after every step
//! - No rendering or platform dependencies

pub mod block;
pub mod layout;
pub mod noise;
pub mod state;
pub mod tick;
pub mod wave;

pub use block::{Block, UpdateContext, breathing, soft_ceiling};
pub use layout::{GridSpec, build_blocks, edge_fill_cells, effective_width, primary_cells};
pub use noise::Noise;
pub use state::{FieldState, sort_back_to_front};
pub use tick::{StepInput, TickRate, step};
pub use wave::{Wave, annulus_bump, cap_to_headroom};
