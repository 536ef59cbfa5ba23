use std::fmt::{self, Write};

use crate::capture::Capture;
use crate::format::{ContextSwitchType, CtxSwTraceStatus, DeviceUuid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrettyOptions {
    pub show_devices: bool,
    pub show_records: bool,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            show_devices: true,
            show_records: true,
        }
    }
}

/// `8-4-4-4-12` lowercase hex grouping of a device UUID.
pub fn printable_uuid(uuid: &DeviceUuid) -> String {
    let mut out = String::with_capacity(36);
    let mut offset = 0;
    for (i, len) in [4usize, 2, 2, 2, 6].into_iter().enumerate() {
        if i > 0 {
            out.push('-');
        }
        for byte in &uuid[offset..offset + len] {
            let _ = write!(out, "{byte:02x}");
        }
        offset += len;
    }
    out
}

pub fn status_message(status: CtxSwTraceStatus) -> &'static str {
    match status {
        CtxSwTraceStatus::SUPPORTED => "yes",
        CtxSwTraceStatus::UNSUPPORTED_GPU => {
            "no -- unsupported GPU (requires Volta, Turing, or newer)"
        }
        CtxSwTraceStatus::UNSUPPORTED_DRIVER => {
            "no -- driver is missing required support, try a newer version"
        }
        CtxSwTraceStatus::NEED_ROOT => {
            "no -- process must be running as root/admin to use this feature"
        }
        _ => "no -- internal error encountered",
    }
}

pub fn event_label(kind: ContextSwitchType) -> &'static str {
    match kind {
        ContextSwitchType::SWITCHED_IN => "Context Start",
        ContextSwitchType::SWITCHED_OUT => "Context Stop",
        _ => "<Other>",
    }
}

pub fn pretty_print<W: Write>(
    out: &mut W,
    capture: &Capture,
    options: PrettyOptions,
) -> fmt::Result {
    if options.show_devices {
        for (d, desc) in capture.device_descs().iter().enumerate() {
            writeln!(out, "Device {d}:")?;
            writeln!(out, "\tName: {}", desc.name)?;
            writeln!(out, "\tUUID: {{{}}}", printable_uuid(&desc.uuid))?;
            writeln!(
                out,
                "\tSupports GPU context-switch trace: {}",
                status_message(desc.ctx_sw_trace_status)
            )?;
            writeln!(out, "\tTimestamps for synchronization (raw values, in hex):")?;
            writeln!(
                out,
                "\t  CPU start: {:x} GPU start: {:x}",
                desc.cpu_timestamp_start, desc.gpu_timestamp_start
            )?;
            writeln!(
                out,
                "\t  CPU end:   {:x} GPU end:   {:x}",
                desc.cpu_timestamp_end, desc.gpu_timestamp_end
            )?;
        }
    }

    if options.show_records {
        for (d, records) in capture.per_device_data().iter().enumerate() {
            writeln!(out, "Device {d} records:")?;
            for record in records {
                writeln!(
                    out,
                    "\tTimestamp: 0x{:016x} | Event: {:<13} | PID: {:<10} | ContextID: 0x{:08x}",
                    record.timestamp,
                    event_label(record.kind),
                    record.process_id,
                    record.context_handle
                )?;
            }
        }
    }
    Ok(())
}

/// Renders the whole capture with both sections enabled.
pub fn to_pretty_string(capture: &Capture) -> String {
    let mut out = String::new();
    let _ = pretty_print(&mut out, capture, PrettyOptions::default());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{ContextSwitchRecord, DeviceDesc};

    #[test]
    fn uuid_groups_are_zero_padded() {
        let mut uuid = [0u8; 16];
        uuid[0] = 0x0a;
        uuid[15] = 0xff;
        assert_eq!(
            printable_uuid(&uuid),
            "0a000000-0000-0000-0000-0000000000ff"
        );
    }

    #[test]
    fn lists_device_and_record_fields() {
        let mut desc = DeviceDesc {
            ctx_sw_trace_status: CtxSwTraceStatus::NEED_ROOT,
            cpu_timestamp_start: 0xabc,
            gpu_timestamp_end: 0x10,
            ..DeviceDesc::default()
        };
        desc.set_name("Quadro");
        let mut capture = Capture::new();
        capture.push_device(
            desc,
            vec![ContextSwitchRecord::new(
                ContextSwitchType::SWITCHED_IN,
                42,
                0x1f,
                0xbeef,
            )],
        );

        let text = to_pretty_string(&capture);
        assert!(text.contains("Device 0:\n\tName: Quadro\n"));
        assert!(text.contains("root/admin"));
        assert!(text.contains("CPU start: abc"));
        assert!(text.contains("GPU end:   10"));
        assert!(text.contains(
            "\tTimestamp: 0x000000000000001f | Event: Context Start | PID: 42         | ContextID: 0x0000beef"
        ));
    }

    #[test]
    fn sections_can_be_disabled() {
        let mut capture = Capture::new();
        capture.push_device(DeviceDesc::default(), Vec::new());

        let mut devices_only = String::new();
        pretty_print(
            &mut devices_only,
            &capture,
            PrettyOptions {
                show_devices: true,
                show_records: false,
            },
        )
        .unwrap();
        assert!(devices_only.starts_with("Device 0:"));
        assert!(!devices_only.contains("records:"));

        let mut records_only = String::new();
        pretty_print(
            &mut records_only,
            &capture,
            PrettyOptions {
                show_devices: false,
                show_records: true,
            },
        )
        .unwrap();
        assert_eq!(records_only, "Device 0 records:\n");
    }

    #[test]
    fn unrecognized_values_fall_back() {
        assert_eq!(status_message(CtxSwTraceStatus(9)), "no -- internal error encountered");
        assert_eq!(event_label(ContextSwitchType(9)), "<Other>");
    }
}
