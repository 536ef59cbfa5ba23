#![forbid(unsafe_code)]

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use nvtrc_format::{
    pretty_print, read_capture_file, write_capture_file, Capture, ContextSwitchRecord,
    ContextSwitchType, CtxSwTraceStatus, DeviceDesc, PrettyOptions,
};
use nvtrc_timeline::{load_file, AdaptOptions, ClockDomain, SharedStringPool, TickRate};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "nvtrc-dump",
    about = "Inspect NVIDIA GPU context-switch captures (.nvtrc)."
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print device descriptors and records as text
    Show {
        /// Capture file path
        input: PathBuf,

        /// Omit the device descriptor section
        #[arg(long, action = clap::ArgAction::SetTrue)]
        no_devices: bool,

        /// Omit the per-device record listing
        #[arg(long, action = clap::ArgAction::SetTrue)]
        no_records: bool,

        /// Convert record timestamps into each device's CPU counter domain
        #[arg(long, action = clap::ArgAction::SetTrue)]
        cpu_time: bool,
    },

    /// Print the adapted timeline events, one per line
    Timeline {
        /// Capture file path
        input: PathBuf,

        /// Convert record timestamps into each device's CPU counter domain
        #[arg(long, action = clap::ArgAction::SetTrue)]
        cpu_time: bool,

        /// Counter frequency used to express timestamps in microseconds (defaults to 1 tick = 1 us)
        #[arg(long, value_name = "HZ")]
        tick_hz: Option<u64>,
    },

    /// Write a synthetic capture
    Synth {
        /// Output capture path
        output: PathBuf,

        /// Number of devices
        #[arg(long, default_value_t = 1)]
        devices: u32,

        /// Records per device
        #[arg(long, default_value_t = 8)]
        records: u32,

        /// Allow overwriting an existing output file
        #[arg(long, action = clap::ArgAction::SetTrue)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    run(args)
}

fn run(args: Args) -> anyhow::Result<()> {
    match args.command {
        Command::Show {
            input,
            no_devices,
            no_records,
            cpu_time,
        } => {
            let mut capture = read_capture_file(&input)
                .with_context(|| format!("read capture {}", input.display()))?;
            if cpu_time {
                capture = capture.to_cpu_time();
            }

            let mut text = String::new();
            pretty_print(
                &mut text,
                &capture,
                PrettyOptions {
                    show_devices: !no_devices,
                    show_records: !no_records,
                },
            )?;
            io::stdout().lock().write_all(text.as_bytes())?;
        }
        Command::Timeline {
            input,
            cpu_time,
            tick_hz,
        } => {
            let tick_rate = match tick_hz {
                Some(hz) => TickRate::from_hz(hz)?,
                None => TickRate::MICROSECONDS,
            };
            let options = AdaptOptions {
                clock: if cpu_time {
                    ClockDomain::Cpu
                } else {
                    ClockDomain::Gpu
                },
                tick_rate,
            };

            let mut pool = SharedStringPool::new();
            let mut lines = Vec::new();
            let info = load_file(&input, &mut pool, options, |event| {
                lines.push(format!(
                    "{} {} pid={} {} ctx=0x{:x}",
                    event.device_index, event.ts, event.pid, event.name, event.context_handle
                ));
            })
            .with_context(|| format!("load capture {}", input.display()))?;

            let mut out = io::stdout().lock();
            writeln!(out, "# uname: {}", info.uname)?;
            match info.min_file_ts {
                Some(ts) => writeln!(out, "# min_file_ts: {ts}")?,
                None => writeln!(out, "# min_file_ts: -")?,
            }
            for line in lines {
                writeln!(out, "{line}")?;
            }
        }
        Command::Synth {
            output,
            devices,
            records,
            force,
        } => {
            if output.exists() && !force {
                bail!(
                    "refusing to overwrite {} (use --force to override)",
                    output.display()
                );
            }
            let capture = synthetic_capture(devices, records);
            write_capture_file(&output, &capture)
                .with_context(|| format!("write capture {}", output.display()))?;
            tracing::info!(
                path = %output.display(),
                devices,
                records,
                "wrote synthetic capture"
            );
        }
    }
    Ok(())
}

/// Alternating switch-in/switch-out pairs, 1000 GPU ticks apart, on a CPU clock running twice as
/// fast with an arbitrary epoch.
fn synthetic_capture(devices: u32, records: u32) -> Capture {
    let mut capture = Capture::new();
    for d in 0..devices {
        let gpu_start = 1_000_000 * i64::from(d);
        let gpu_end = gpu_start + 1000 * i64::from(records.max(1));
        let cpu_start = 0x10_0000_0000 + 2 * gpu_start;

        let mut desc = DeviceDesc {
            uuid: [d as u8; 16],
            ctx_sw_trace_status: CtxSwTraceStatus::SUPPORTED,
            cpu_timestamp_start: cpu_start,
            gpu_timestamp_start: gpu_start,
            cpu_timestamp_end: cpu_start + 2 * (gpu_end - gpu_start),
            gpu_timestamp_end: gpu_end,
            ..DeviceDesc::default()
        };
        desc.set_name(&format!("Synthetic GPU {d}"));

        let device_records = (0..records)
            .map(|i| {
                let kind = if i % 2 == 0 {
                    ContextSwitchType::SWITCHED_IN
                } else {
                    ContextSwitchType::SWITCHED_OUT
                };
                ContextSwitchRecord::new(
                    kind,
                    1000 + i / 2,
                    gpu_start + 1000 * i64::from(i),
                    0x100 + u64::from(i / 2),
                )
            })
            .collect();
        capture.push_device(desc, device_records);
    }
    capture
}
