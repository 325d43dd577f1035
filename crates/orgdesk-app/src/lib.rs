// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod errors;
pub mod forms;
pub mod ids;
pub mod listing;
pub mod model;
pub mod page;
pub mod session;
pub mod state;
pub mod table;
pub mod visitors;

pub use errors::*;
pub use forms::*;
pub use ids::*;
pub use listing::*;
pub use model::*;
pub use page::*;
pub use session::*;
pub use state::*;
pub use table::*;
pub use visitors::*;
