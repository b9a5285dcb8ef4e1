//! Static and dynamic balancing of point masses on a rotating shaft.
//!
//! The core is [`math::evaluate_balance`], a pure function of the masses and
//! the rotation phase. [`driver::AnimationDriver`] advances the phase once per
//! scheduler tick, re-reads the masses from a [`inputs::MassSource`], redraws
//! the [`graphics::Canvas`] and publishes the [`math::BalanceResult`].

pub mod config;
pub mod driver;
pub mod error;
pub mod graphics;
pub mod inputs;
pub mod mass;
pub mod math;
pub mod scheduler;
pub mod state;
pub mod widget;

pub use config::SimConfig;
pub use driver::AnimationDriver;
pub use error::{Error, Result};
pub use inputs::{MassInputs, MassSource};
pub use mass::Mass;
pub use math::{evaluate_balance, BalanceResult, Verdict};
