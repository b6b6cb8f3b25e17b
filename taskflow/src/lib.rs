//! TaskFlow library
//!
//! Client core of the TaskFlow project and task manager: the backend
//! client seam, the domain store, the auth context and the derived view
//! state the UI renders.

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod services;
pub mod views;
