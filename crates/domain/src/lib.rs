//! # shadehub-domain
//!
//! Pure domain model for the shadehub shade-control system.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Blinds** and **Rooms** (the static registry loaded at startup)
//! - Define the **Location** (latitude, longitude, IANA timezone)
//! - Define **StructuredIntents** (validated output of the NLU collaborator)
//! - Define **ResolvedActions** (per-blind targets produced by the planner)
//! - Define **Schedules** (trigger → expiry lifecycle records)
//! - Provide the **solar calculator** (pure sunrise/sunset/sun-position math)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod action;
pub mod intent;
pub mod location;
pub mod orientation;
pub mod registry;
pub mod schedule;
pub mod solar;
pub mod tunables;
