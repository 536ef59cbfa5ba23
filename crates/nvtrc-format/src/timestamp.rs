//! Affine conversion between two independent monotonic counter domains.
//!
//! A converter is built from two sync points (start and end of capture, sampled in both domains)
//! and anchored at the **end** sync point. The `f64` mantissa loses roughly one destination unit per
//! week of distance from the anchor at 1 GHz, and the region of interest in a snapshot-style capture
//! sits near its end.

use std::collections::BTreeMap;

use crate::capture::Capture;
use crate::format::{DeviceDesc, DeviceUuid};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimestampConverter {
    dst_at_sync_point: i64,
    src_at_sync_point: i64,
    scale: f64,
}

impl TimestampConverter {
    /// Maps `src_start..=src_end` onto `dst_start..=dst_end`. A zero-length source span yields a
    /// scale of `0`, collapsing every input onto `dst_end`.
    pub fn new(src_start: i64, src_end: i64, dst_start: i64, dst_end: i64) -> Self {
        let src_delta = i128::from(src_end) - i128::from(src_start);
        let dst_delta = i128::from(dst_end) - i128::from(dst_start);
        let scale = if src_delta == 0 {
            0.0
        } else {
            dst_delta as f64 / src_delta as f64
        };

        Self {
            dst_at_sync_point: dst_end,
            src_at_sync_point: src_end,
            scale,
        }
    }

    /// GPU-domain to CPU-domain converter using the device's own sync points.
    pub fn gpu_to_cpu(desc: &DeviceDesc) -> Self {
        Self::new(
            desc.gpu_timestamp_start,
            desc.gpu_timestamp_end,
            desc.cpu_timestamp_start,
            desc.cpu_timestamp_end,
        )
    }

    /// GPU-to-CPU converter spanning several captures of the same device: the start sync point of
    /// the earliest capture and the end sync point of the latest. Returns `None` for no input.
    ///
    /// Converting merged captures through one converter avoids seams at capture boundaries.
    pub fn spanning<'a>(descs: impl IntoIterator<Item = &'a DeviceDesc>) -> Option<Self> {
        let descs: Vec<&DeviceDesc> = descs.into_iter().collect();
        let earliest = descs.iter().min_by_key(|d| d.gpu_timestamp_start)?;
        let latest = descs.iter().max_by_key(|d| d.gpu_timestamp_end)?;
        Some(Self::new(
            earliest.gpu_timestamp_start,
            latest.gpu_timestamp_end,
            earliest.cpu_timestamp_start,
            latest.cpu_timestamp_end,
        ))
    }

    pub fn convert(&self, src_timestamp: i64) -> i64 {
        let src_delta = (i128::from(src_timestamp) - i128::from(self.src_at_sync_point)) as f64;
        // `as` saturates on overflow and maps NaN to 0.
        let dst_delta = (src_delta * self.scale).round() as i64;
        self.dst_at_sync_point.saturating_add(dst_delta)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn src_at_sync_point(&self) -> i64 {
        self.src_at_sync_point
    }

    pub fn dst_at_sync_point(&self) -> i64 {
        self.dst_at_sync_point
    }
}

/// One spanning converter per device UUID across all `captures`.
pub fn merged_converters<'a>(
    captures: impl IntoIterator<Item = &'a Capture>,
) -> BTreeMap<DeviceUuid, TimestampConverter> {
    let mut by_device: BTreeMap<DeviceUuid, Vec<&DeviceDesc>> = BTreeMap::new();
    for capture in captures {
        for desc in capture.device_descs() {
            by_device.entry(desc.uuid).or_default().push(desc);
        }
    }

    by_device
        .into_iter()
        .filter_map(|(uuid, descs)| Some((uuid, TimestampConverter::spanning(descs)?)))
        .collect()
}
