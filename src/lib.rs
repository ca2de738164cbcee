pub mod cli;
pub mod context;
pub mod em;
pub mod errs;
pub mod idr;
pub mod loader;
pub mod logging;
pub mod merge;
pub mod numeric;
pub mod peak;
pub mod pseudovalue;
pub mod rank;
pub mod writer;
