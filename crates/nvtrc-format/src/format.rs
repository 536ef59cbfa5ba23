use std::fmt;

use crate::array::Record;
use crate::io::ByteCursor;

/// Literal tag at offset 0 of every capture; identifies both the format and its version.
pub const NVTRC_MAGIC: &[u8; 8] = b"nvtrc01\0";

/// Size of the on-disk name buffer, including the mandatory null terminator.
pub const DEVICE_NAME_CAPACITY: usize = 239;
pub const DEVICE_DESC_SIZE: usize = 288;
pub const CONTEXT_SWITCH_RECORD_SIZE: usize = 24;

const _: () = assert!(16 + DEVICE_NAME_CAPACITY + 1 + 4 * 8 == DEVICE_DESC_SIZE);
const _: () = assert!(2 + 2 + 4 + 8 + 8 == CONTEXT_SWITCH_RECORD_SIZE);

/// Hardware device UUID (`VkPhysicalDeviceIDProperties::deviceUUID`). Opaque.
pub type DeviceUuid = [u8; 16];

/// Outcome of enabling GPU context-switch tracing, recorded once per device at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CtxSwTraceStatus(pub u8);

impl CtxSwTraceStatus {
    pub const SUPPORTED: CtxSwTraceStatus = CtxSwTraceStatus(0);
    pub const UNSUPPORTED_GPU: CtxSwTraceStatus = CtxSwTraceStatus(1);
    pub const UNSUPPORTED_DRIVER: CtxSwTraceStatus = CtxSwTraceStatus(2);
    pub const NEED_ROOT: CtxSwTraceStatus = CtxSwTraceStatus(3);
    pub const UNKNOWN: CtxSwTraceStatus = CtxSwTraceStatus(255);

    pub fn name(self) -> Option<&'static str> {
        match self {
            CtxSwTraceStatus::SUPPORTED => Some("Supported"),
            CtxSwTraceStatus::UNSUPPORTED_GPU => Some("UnsupportedGpu"),
            CtxSwTraceStatus::UNSUPPORTED_DRIVER => Some("UnsupportedDriver"),
            CtxSwTraceStatus::NEED_ROOT => Some("NeedRoot"),
            CtxSwTraceStatus::UNKNOWN => Some("Unknown"),
            _ => None,
        }
    }

    pub fn is_supported(self) -> bool {
        self == CtxSwTraceStatus::SUPPORTED
    }
}

impl Default for CtxSwTraceStatus {
    fn default() -> Self {
        CtxSwTraceStatus::SUPPORTED
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Category(pub u16);

impl Category {
    pub const INVALID: Category = Category(0);
    pub const GPU_CONTEXT_SWITCH: Category = Category(1);

    pub fn name(self) -> Option<&'static str> {
        match self {
            Category::INVALID => Some("Invalid"),
            Category::GPU_CONTEXT_SWITCH => Some("GpuContextSwitch"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextSwitchType(pub u16);

impl ContextSwitchType {
    pub const INVALID: ContextSwitchType = ContextSwitchType(0);
    pub const SWITCHED_IN: ContextSwitchType = ContextSwitchType(1);
    pub const SWITCHED_OUT: ContextSwitchType = ContextSwitchType(2);

    pub fn name(self) -> Option<&'static str> {
        match self {
            ContextSwitchType::INVALID => Some("Invalid"),
            ContextSwitchType::SWITCHED_IN => Some("ContextSwitchedIn"),
            ContextSwitchType::SWITCHED_OUT => Some("ContextSwitchedOut"),
            _ => None,
        }
    }
}

/// Fixed-capacity, null-terminated device name as stored on disk.
///
/// The final byte of the buffer is always `0`, so at most `DEVICE_NAME_CAPACITY - 1` bytes of
/// text survive. Truncation is byte-wise and may split a multi-byte UTF-8 sequence; use
/// [`DeviceName::to_string_lossy`] for display.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceName([u8; DEVICE_NAME_CAPACITY]);

impl DeviceName {
    pub fn new(name: &str) -> Self {
        Self::from_bytes(name.as_bytes())
    }

    pub fn from_bytes(name: &[u8]) -> Self {
        let mut buf = [0u8; DEVICE_NAME_CAPACITY];
        let len = name.len().min(DEVICE_NAME_CAPACITY - 1);
        buf[..len].copy_from_slice(&name[..len]);
        Self(buf)
    }

    /// Wraps a raw on-disk buffer. Bytes after the first NUL are kept verbatim, but the final
    /// byte is forced to `0`.
    pub fn from_raw(mut raw: [u8; DEVICE_NAME_CAPACITY]) -> Self {
        raw[DEVICE_NAME_CAPACITY - 1] = 0;
        Self(raw)
    }

    pub fn raw(&self) -> &[u8; DEVICE_NAME_CAPACITY] {
        &self.0
    }

    /// Name bytes up to (not including) the first NUL.
    pub fn as_bytes(&self) -> &[u8] {
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(self.0.len());
        &self.0[..len]
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

impl Default for DeviceName {
    fn default() -> Self {
        Self([0u8; DEVICE_NAME_CAPACITY])
    }
}

impl fmt::Debug for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeviceName")
            .field(&self.to_string_lossy())
            .finish()
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl From<&str> for DeviceName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One traced GPU device plus the sync points captured for it.
///
/// `cpu_*` timestamps are in the CPU counter domain (RDTSC on x86); `gpu_*` timestamps are in the
/// GPU global-timer domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceDesc {
    pub uuid: DeviceUuid,
    pub name: DeviceName,
    pub ctx_sw_trace_status: CtxSwTraceStatus,
    pub cpu_timestamp_start: i64,
    pub gpu_timestamp_start: i64,
    pub cpu_timestamp_end: i64,
    pub gpu_timestamp_end: i64,
}

impl DeviceDesc {
    pub fn set_name(&mut self, name: &str) {
        self.name = DeviceName::new(name);
    }
}

impl Record for DeviceDesc {
    const SIZE: usize = DEVICE_DESC_SIZE;

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.uuid);
        out.extend_from_slice(&self.name.raw()[..DEVICE_NAME_CAPACITY - 1]);
        out.push(0);
        out.push(self.ctx_sw_trace_status.0);
        out.extend_from_slice(&self.cpu_timestamp_start.to_le_bytes());
        out.extend_from_slice(&self.gpu_timestamp_start.to_le_bytes());
        out.extend_from_slice(&self.cpu_timestamp_end.to_le_bytes());
        out.extend_from_slice(&self.gpu_timestamp_end.to_le_bytes());
    }

    fn decode(cur: &mut ByteCursor<'_>) -> Self {
        let uuid = cur.take::<16>();
        let name = DeviceName::from_raw(cur.take::<DEVICE_NAME_CAPACITY>());
        let ctx_sw_trace_status = CtxSwTraceStatus(cur.u8());
        Self {
            uuid,
            name,
            ctx_sw_trace_status,
            cpu_timestamp_start: cur.i64_le(),
            gpu_timestamp_start: cur.i64_le(),
            cpu_timestamp_end: cur.i64_le(),
            gpu_timestamp_end: cur.i64_le(),
        }
    }
}

/// One logged GPU scheduling event. `timestamp` is in the GPU counter domain unless the
/// capture was explicitly converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextSwitchRecord {
    pub category: Category,
    pub kind: ContextSwitchType,
    pub process_id: u32,
    pub timestamp: i64,
    pub context_handle: u64,
}

impl ContextSwitchRecord {
    pub fn new(
        kind: ContextSwitchType,
        process_id: u32,
        timestamp: i64,
        context_handle: u64,
    ) -> Self {
        Self {
            category: Category::GPU_CONTEXT_SWITCH,
            kind,
            process_id,
            timestamp,
            context_handle,
        }
    }
}

impl Record for ContextSwitchRecord {
    const SIZE: usize = CONTEXT_SWITCH_RECORD_SIZE;

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.category.0.to_le_bytes());
        out.extend_from_slice(&self.kind.0.to_le_bytes());
        out.extend_from_slice(&self.process_id.to_le_bytes());
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        out.extend_from_slice(&self.context_handle.to_le_bytes());
    }

    fn decode(cur: &mut ByteCursor<'_>) -> Self {
        Self {
            category: Category(cur.u16_le()),
            kind: ContextSwitchType(cur.u16_le()),
            process_id: cur.u32_le(),
            timestamp: cur.i64_le(),
            context_handle: cur.u64_le(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded<T: Record>(value: &T) -> Vec<u8> {
        let mut out = Vec::new();
        value.encode(&mut out);
        out
    }

    #[test]
    fn device_desc_field_offsets() {
        let mut desc = DeviceDesc {
            uuid: [0xAA; 16],
            ctx_sw_trace_status: CtxSwTraceStatus::NEED_ROOT,
            cpu_timestamp_start: 0x0101_0101_0101_0101,
            gpu_timestamp_start: 0x0202_0202_0202_0202,
            cpu_timestamp_end: 0x0303_0303_0303_0303,
            gpu_timestamp_end: 0x0404_0404_0404_0404,
            ..DeviceDesc::default()
        };
        desc.set_name("GPU");

        let bytes = encoded(&desc);
        assert_eq!(bytes.len(), DEVICE_DESC_SIZE);
        assert_eq!(&bytes[0..16], &[0xAA; 16]);
        assert_eq!(&bytes[16..20], b"GPU\0");
        assert_eq!(bytes[254], 0);
        assert_eq!(bytes[255], 3);
        assert_eq!(&bytes[256..264], &[0x01; 8]);
        assert_eq!(&bytes[264..272], &[0x02; 8]);
        assert_eq!(&bytes[272..280], &[0x03; 8]);
        assert_eq!(&bytes[280..288], &[0x04; 8]);

        let decoded = DeviceDesc::decode(&mut ByteCursor::new(&bytes));
        assert_eq!(decoded, desc);
    }

    #[test]
    fn context_switch_record_field_offsets() {
        let record =
            ContextSwitchRecord::new(ContextSwitchType::SWITCHED_OUT, 0x1234, -2, u64::MAX);
        let bytes = encoded(&record);
        assert_eq!(bytes.len(), CONTEXT_SWITCH_RECORD_SIZE);
        assert_eq!(&bytes[0..2], &1u16.to_le_bytes());
        assert_eq!(&bytes[2..4], &2u16.to_le_bytes());
        assert_eq!(&bytes[4..8], &0x1234u32.to_le_bytes());
        assert_eq!(&bytes[8..16], &(-2i64).to_le_bytes());
        assert_eq!(&bytes[16..24], &[0xFF; 8]);
    }

    #[test]
    fn long_names_are_truncated_with_terminator() {
        let long = "x".repeat(300);
        let name = DeviceName::new(&long);
        assert_eq!(name.as_bytes().len(), DEVICE_NAME_CAPACITY - 1);
        assert_eq!(name.raw()[DEVICE_NAME_CAPACITY - 1], 0);
        assert_eq!(name.as_bytes(), &long.as_bytes()[..DEVICE_NAME_CAPACITY - 1]);
    }

    #[test]
    fn raw_name_without_terminator_is_forced_terminated() {
        let name = DeviceName::from_raw([b'a'; DEVICE_NAME_CAPACITY]);
        assert_eq!(name.as_bytes().len(), DEVICE_NAME_CAPACITY - 1);
        assert_eq!(name.raw()[DEVICE_NAME_CAPACITY - 1], 0);
    }

    #[test]
    fn unknown_enum_values_have_no_name() {
        assert_eq!(CtxSwTraceStatus(42).name(), None);
        assert_eq!(ContextSwitchType(7).name(), None);
        assert_eq!(Category::GPU_CONTEXT_SWITCH.name(), Some("GpuContextSwitch"));
    }
}
