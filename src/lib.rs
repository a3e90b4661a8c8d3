//! Headless front end for the Mimetic engine: the run driver used by the
//! `mimetic` binary and the history report used by `mimetic-analyze`.

pub mod app;
pub mod report;
