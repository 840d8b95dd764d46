// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod aggregation;
pub mod milestone_edit;
pub mod progress;
pub mod session;
pub mod tracker;

pub use aggregation::{Aggregate, FeedEntry, Standing};
pub use progress::{MilestoneStatus, Progress};
pub use session::ActiveGroup;
pub use tracker::{Dashboard, EntryInput, GroupService};
