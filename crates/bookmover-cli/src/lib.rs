//! Binary-facing wiring for the worker and supervisor processes: CLI
//! surface (§6), environment-variable credentials, and the glue that turns
//! parsed flags into the trait objects `bookmover-worker` and
//! `bookmover-supervisor` expect. Kept as a library so `src/bin/*.rs` stays
//! a thin `Args::parse()` + `run(args).await` shell.

pub mod supervisor;
pub mod tracing_init;
pub mod worker;
