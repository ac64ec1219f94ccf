//! Analytics module - resampling and descriptive statistics over merged tables.

mod analytics_model;
mod resampler;
mod season;
mod statistics;

pub use analytics_model::{Interval, StatisticKind};
pub use resampler::resample;
pub use season::Season;
pub use statistics::summarize;
