//! Command handlers grouped by concern.

pub(crate) mod catalog;
pub(crate) mod explore;
pub(crate) mod favorites;
