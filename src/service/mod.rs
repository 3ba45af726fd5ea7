//! Request-independent business logic, written as `impl AppState` blocks so
//! handlers stay thin. Anything that depends on the current time takes `now`
//! as an argument.

pub mod attendance;
pub mod query;
pub mod registry;
