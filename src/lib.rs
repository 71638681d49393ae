//! Lease Form — a step-by-step questionnaire that fills a residential lease.

pub mod channels;
pub mod config;
pub mod error;
pub mod form;
