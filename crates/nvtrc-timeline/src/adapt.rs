use std::path::{Path, PathBuf};

use nvtrc_format::{read_capture_file, Capture, TimestampConverter};

use crate::error::{Result, TimelineError};
use crate::event::{
    event_name, EventFlags, TimelineEvent, EVENT_COMM, EVENT_SYSTEM, EVENT_USER_COMM,
};
use crate::pool::StringPool;

/// Counter domain adapted timestamps are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockDomain {
    /// Raw GPU global-timer values, as stored in the capture.
    #[default]
    Gpu,
    /// Each device's records converted through its own GPU-to-CPU sync points.
    Cpu,
}

/// Rate of the selected counter domain, used to express timestamps in microseconds.
///
/// The producer does not record its counter frequency. [`TickRate::MICROSECONDS`] treats one tick
/// as one microsecond; callers that know the real rate should pass it with [`TickRate::from_hz`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRate {
    hz: u64,
}

impl TickRate {
    pub const MICROSECONDS: TickRate = TickRate { hz: 1_000_000 };

    pub fn from_hz(hz: u64) -> Result<Self> {
        if hz == 0 {
            return Err(TimelineError::InvalidTickRate);
        }
        Ok(Self { hz })
    }

    pub fn hz(&self) -> u64 {
        self.hz
    }

    pub fn to_us(&self, ticks: i64) -> i64 {
        if self.hz == Self::MICROSECONDS.hz {
            return ticks;
        }
        let us = i128::from(ticks) * 1_000_000 / i128::from(self.hz);
        us.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self::MICROSECONDS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdaptOptions {
    pub clock: ClockDomain,
    pub tick_rate: TickRate,
}

/// File-level summary handed to the host alongside the events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceInfo {
    /// `nvgpu(<name>)` per device, joined with `&`.
    pub uname: String,
    pub timestamp_in_us: bool,
    pub cpus: u32,
    pub file: PathBuf,
    /// Earliest capture-start sync point across devices, in microseconds of the selected domain.
    pub min_file_ts: Option<i64>,
}

pub fn trace_info(capture: &Capture, file: &Path, options: AdaptOptions) -> TraceInfo {
    let uname = capture
        .device_descs()
        .iter()
        .map(|desc| format!("nvgpu({})", desc.name))
        .collect::<Vec<_>>()
        .join("&");

    let min_file_ts = capture
        .device_descs()
        .iter()
        .map(|desc| match options.clock {
            ClockDomain::Gpu => desc.gpu_timestamp_start,
            ClockDomain::Cpu => desc.cpu_timestamp_start,
        })
        .min()
        .map(|ticks| options.tick_rate.to_us(ticks));

    TraceInfo {
        uname,
        timestamp_in_us: true,
        cpus: 0,
        file: file.to_path_buf(),
        min_file_ts,
    }
}

/// Feeds every record of `capture` to `sink` in device order, returning the number of events.
pub fn adapt_events<P, F>(
    capture: &Capture,
    pool: &mut P,
    options: AdaptOptions,
    mut sink: F,
) -> usize
where
    P: StringPool,
    F: FnMut(TimelineEvent<P::Handle>),
{
    let comm = pool.intern(EVENT_COMM);
    let system = pool.intern(EVENT_SYSTEM);
    let user_comm = pool.intern(EVENT_USER_COMM);

    let mut count = 0;
    for (device_index, (desc, records)) in capture.devices().enumerate() {
        let convert = match options.clock {
            ClockDomain::Gpu => None,
            ClockDomain::Cpu => Some(TimestampConverter::gpu_to_cpu(desc)),
        };

        for record in records {
            let ticks = match &convert {
                Some(convert) => convert.convert(record.timestamp),
                None => record.timestamp,
            };
            sink(TimelineEvent {
                device_index,
                pid: record.process_id,
                ts: options.tick_rate.to_us(ticks),
                kind: record.kind,
                context_handle: record.context_handle,
                cpu: 0,
                flags: EventFlags::AUTOGEN_COLOR,
                graph_row_id: 0,
                id: None,
                id_start: None,
                seqno: None,
                crtc: None,
                color: None,
                duration: None,
                comm: comm.clone(),
                system: system.clone(),
                name: pool.intern(event_name(record.kind)),
                user_comm: user_comm.clone(),
            });
            count += 1;
        }
    }
    count
}

/// Loads a capture file and adapts it in one pass.
///
/// Nothing reaches `sink` unless the whole file decodes.
pub fn load_file<P, F>(
    path: impl AsRef<Path>,
    pool: &mut P,
    options: AdaptOptions,
    sink: F,
) -> Result<TraceInfo>
where
    P: StringPool,
    F: FnMut(TimelineEvent<P::Handle>),
{
    let path = path.as_ref();
    let capture = read_capture_file(path)?;

    for (i, (desc, records)) in capture.devices().enumerate() {
        tracing::info!(
            file = %path.display(),
            device = i + 1,
            name = %desc.name,
            records = records.len(),
            "loaded GPU device"
        );
    }

    let info = trace_info(&capture, path, options);
    adapt_events(&capture, pool, options, sink);
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_tick_rate_passes_values_through() {
        let rate = TickRate::default();
        assert_eq!(rate.to_us(-5), -5);
        assert_eq!(rate.to_us(i64::MAX), i64::MAX);
    }

    #[test]
    fn explicit_tick_rate_scales_to_microseconds() {
        let ghz = TickRate::from_hz(1_000_000_000).unwrap();
        assert_eq!(ghz.to_us(2_500_000), 2_500);
        let slow = TickRate::from_hz(1).unwrap();
        assert_eq!(slow.to_us(i64::MAX), i64::MAX);
    }

    #[test]
    fn zero_tick_rate_is_rejected() {
        assert!(matches!(
            TickRate::from_hz(0),
            Err(TimelineError::InvalidTickRate)
        ));
    }
}
