#![forbid(unsafe_code)]

//! `nvtrc` GPU context-switch capture container.
//!
//! A capture is an 8-byte magic tag (`nvtrc01\0`), one versioned array of [`DeviceDesc`], and one
//! versioned array of [`ContextSwitchRecord`] per device, in device order. All integers are
//! little-endian. Record timestamps stay in the GPU counter domain until a caller converts them
//! with a [`TimestampConverter`].

mod array;
mod capture;
mod error;
mod format;
mod io;
mod pretty;
mod timestamp;

pub use crate::array::{read_array, write_array, ArrayHeader, Record, ARRAY_HEADER_SIZE};
pub use crate::capture::{read_capture_file, write_capture_file, Capture};
pub use crate::error::{NvtrcError, Result};
pub use crate::format::{
    Category, ContextSwitchRecord, ContextSwitchType, CtxSwTraceStatus, DeviceDesc, DeviceName,
    DeviceUuid, CONTEXT_SWITCH_RECORD_SIZE, DEVICE_DESC_SIZE, DEVICE_NAME_CAPACITY, NVTRC_MAGIC,
};
pub use crate::io::ByteCursor;
pub use crate::pretty::{
    event_label, pretty_print, printable_uuid, status_message, to_pretty_string, PrettyOptions,
};
pub use crate::timestamp::{merged_converters, TimestampConverter};
