pub mod cancel;
pub mod run_guard;
