#![forbid(unsafe_code)]

//! Projects decoded `nvtrc` captures onto a host's generic event timeline.
//!
//! The host supplies a [`StringPool`] and an event callback; this crate produces one
//! [`TimelineEvent`] per context-switch record plus a [`TraceInfo`] summary. Timestamps stay in the
//! GPU domain unless [`ClockDomain::Cpu`] is requested.

mod adapt;
mod error;
mod event;
mod pool;

pub use crate::adapt::{
    adapt_events, load_file, trace_info, AdaptOptions, ClockDomain, TickRate, TraceInfo,
};
pub use crate::error::{Result, TimelineError};
pub use crate::event::{event_name, EventFlags, TimelineEvent};
pub use crate::pool::{SharedStringPool, StringPool};
