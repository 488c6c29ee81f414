#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

//! Bolt-point generation and level assembly for a disassembly puzzle.
//!
//! Pipeline: [`points::generate`] spreads a requested number of points over
//! the tracked meshes of a [`scene::Scene`], validates them against mesh depth
//! with ray casts and snaps them onto the surface. The exported points feed
//! [`level::build_level`], whose bolts are ordered and grouped by
//! [`analyze::Analyzer`] and played through a [`play::Session`].

pub mod analyze;
pub mod format;
pub mod geom;
pub mod graph;
pub mod level;
pub mod metrics;
pub mod play;
pub mod points;
pub mod scene;

pub use points::{GenerationError, GeneratorSettings, generate};
pub use scene::{MeshId, MeshRecord, Scene};
