// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod battle;
pub mod collection;
pub mod dialog;
pub mod ids;
pub mod model;
pub mod nickname;
pub mod pager;
pub mod state;

pub use battle::*;
pub use collection::*;
pub use dialog::*;
pub use ids::*;
pub use model::*;
pub use nickname::*;
pub use pager::*;
pub use state::*;
