//! Query execution for quarrydb

mod executor;
mod plan;

pub use executor::{QueryResult, SqlExecutor};
pub use plan::{EvalPlan, Pipeline};
