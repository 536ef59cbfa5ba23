use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::array::{read_array, write_array};
use crate::error::{NvtrcError, Result};
use crate::format::{ContextSwitchRecord, DeviceDesc, NVTRC_MAGIC};
use crate::io::{eof_as, ReadLeExt, WriteLeExt};
use crate::timestamp::TimestampConverter;

/// One decoded trace file: device descriptors plus one record list per device.
///
/// `per_device_data[i]` always belongs to `device_descs[i]`; the two lists have equal length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capture {
    device_descs: Vec<DeviceDesc>,
    per_device_data: Vec<Vec<ContextSwitchRecord>>,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a device and its records, returning the device index.
    pub fn push_device(&mut self, desc: DeviceDesc, records: Vec<ContextSwitchRecord>) -> usize {
        self.device_descs.push(desc);
        self.per_device_data.push(records);
        self.device_descs.len() - 1
    }

    pub fn device_descs(&self) -> &[DeviceDesc] {
        &self.device_descs
    }

    pub fn per_device_data(&self) -> &[Vec<ContextSwitchRecord>] {
        &self.per_device_data
    }

    pub fn device_count(&self) -> usize {
        self.device_descs.len()
    }

    pub fn records(&self, device: usize) -> Option<&[ContextSwitchRecord]> {
        self.per_device_data.get(device).map(Vec::as_slice)
    }

    /// Iterates `(descriptor, records)` pairs in device-index order.
    pub fn devices(&self) -> impl Iterator<Item = (&DeviceDesc, &[ContextSwitchRecord])> {
        self.device_descs
            .iter()
            .zip(self.per_device_data.iter().map(Vec::as_slice))
    }

    pub fn record_count(&self) -> usize {
        self.per_device_data.iter().map(Vec::len).sum()
    }

    /// One GPU-to-CPU converter per device, index-aligned with [`Capture::device_descs`].
    pub fn cpu_converters(&self) -> Vec<TimestampConverter> {
        self.device_descs
            .iter()
            .map(TimestampConverter::gpu_to_cpu)
            .collect()
    }

    /// Returns a copy with every record timestamp converted from its device's GPU domain into the
    /// CPU domain. Decoding never does this implicitly.
    pub fn to_cpu_time(&self) -> Capture {
        let per_device_data = self
            .devices()
            .map(|(desc, records)| {
                let convert = TimestampConverter::gpu_to_cpu(desc);
                records
                    .iter()
                    .map(|record| ContextSwitchRecord {
                        timestamp: convert.convert(record.timestamp),
                        ..*record
                    })
                    .collect()
            })
            .collect();
        Capture {
            device_descs: self.device_descs.clone(),
            per_device_data,
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::read_from(&mut &bytes[..])
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Reads a complete capture. On error nothing partial is returned.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let magic: [u8; 8] = r.read_array().map_err(|e| {
            eof_as(
                e,
                NvtrcError::TruncatedOrCorruptHeader("file shorter than magic tag"),
            )
        })?;
        if &magic != NVTRC_MAGIC {
            return Err(NvtrcError::BadMagicTag { found: magic });
        }

        let device_descs: Vec<DeviceDesc> = read_array(r)?;
        let mut per_device_data = Vec::with_capacity(device_descs.len());
        for _ in 0..device_descs.len() {
            per_device_data.push(read_array(r)?);
        }

        let capture = Capture {
            device_descs,
            per_device_data,
        };
        tracing::debug!(
            devices = capture.device_count(),
            records = capture.record_count(),
            "decoded capture"
        );
        Ok(capture)
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_bytes(NVTRC_MAGIC)?;
        write_array(w, &self.device_descs)?;
        for records in &self.per_device_data {
            write_array(w, records)?;
        }
        Ok(())
    }
}

pub fn read_capture_file(path: impl AsRef<Path>) -> Result<Capture> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| NvtrcError::StreamOpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    Capture::read_from(&mut BufReader::new(file))
}

/// Writes `capture` to `path` via a sibling temporary file that is renamed into place, so readers
/// never observe a partially written capture.
pub fn write_capture_file(path: impl AsRef<Path>, capture: &Capture) -> Result<()> {
    let path = path.as_ref();
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(format!(".tmp.{}", std::process::id()));
    let tmp_path = path.with_file_name(tmp_name);

    let result: Result<()> = (|| {
        let file = File::create(&tmp_path).map_err(|source| NvtrcError::StreamCreateFailed {
            path: tmp_path.clone(),
            source,
        })?;
        let mut w = BufWriter::new(file);
        capture.write_to(&mut w)?;
        w.into_inner()
            .map_err(|e| NvtrcError::Io(e.into_error()))?
            .sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    } else {
        tracing::debug!(
            path = %path.display(),
            devices = capture.device_count(),
            records = capture.record_count(),
            "wrote capture"
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{ContextSwitchType, CtxSwTraceStatus};

    fn desc(name: &str) -> DeviceDesc {
        let mut desc = DeviceDesc {
            uuid: [7; 16],
            ctx_sw_trace_status: CtxSwTraceStatus::SUPPORTED,
            gpu_timestamp_start: 1000,
            gpu_timestamp_end: 2000,
            cpu_timestamp_start: 500_000,
            cpu_timestamp_end: 500_500,
            ..DeviceDesc::default()
        };
        desc.set_name(name);
        desc
    }

    #[test]
    fn empty_capture_layout() {
        let bytes = Capture::new().encode().unwrap();
        assert_eq!(&bytes[..8], NVTRC_MAGIC);
        assert_eq!(&bytes[8..12], &0i32.to_le_bytes());
        assert_eq!(&bytes[12..16], &288i32.to_le_bytes());
        assert_eq!(bytes.len(), 16);
    }

    #[test]
    fn to_cpu_time_converts_each_device() {
        let mut capture = Capture::new();
        capture.push_device(
            desc("a"),
            vec![ContextSwitchRecord::new(
                ContextSwitchType::SWITCHED_IN,
                1,
                1500,
                9,
            )],
        );
        let converted = capture.to_cpu_time();
        assert_eq!(converted.records(0).unwrap()[0].timestamp, 500_250);
        assert_eq!(capture.records(0).unwrap()[0].timestamp, 1500);
        assert_eq!(converted.device_descs(), capture.device_descs());
    }

    #[test]
    fn cpu_converters_are_index_aligned() {
        let mut capture = Capture::new();
        capture.push_device(desc("a"), Vec::new());
        let mut second = desc("b");
        second.cpu_timestamp_end = 501_000;
        capture.push_device(second, Vec::new());

        let converters = capture.cpu_converters();
        assert_eq!(converters.len(), 2);
        assert_eq!(converters[0].convert(1500), 500_250);
        assert_eq!(converters[1].convert(1500), 500_500);
    }

    #[test]
    fn records_out_of_range_is_none() {
        assert!(Capture::new().records(0).is_none());
    }
}
