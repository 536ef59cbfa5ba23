use bitflags::bitflags;
use nvtrc_format::ContextSwitchType;

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct EventFlags: u32 {
        /// The host picks the event colour itself.
        const AUTOGEN_COLOR = 1 << 0;
    }
}

/// One context-switch record expressed in the host's generic event shape.
///
/// `None` marks fields the capture format does not populate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEvent<H> {
    pub device_index: usize,
    pub pid: u32,
    /// Microseconds in the selected clock domain.
    pub ts: i64,
    pub kind: ContextSwitchType,
    pub context_handle: u64,
    pub cpu: u32,
    pub flags: EventFlags,
    pub graph_row_id: u32,
    pub id: Option<u32>,
    pub id_start: Option<u32>,
    pub seqno: Option<u32>,
    pub crtc: Option<i32>,
    pub color: Option<u32>,
    pub duration: Option<i64>,
    pub comm: H,
    pub system: H,
    pub name: H,
    pub user_comm: H,
}

pub(crate) const EVENT_SYSTEM: &str = "nvcontext";
pub(crate) const EVENT_COMM: &str = "(event_comm)";
pub(crate) const EVENT_USER_COMM: &str = "(event_usercomm)";

/// Event-kind label; unrecognized raw values share the `Invalid` label.
pub fn event_name(kind: ContextSwitchType) -> &'static str {
    match kind {
        ContextSwitchType::SWITCHED_IN => "(event_name:ContextSwitchedIn)",
        ContextSwitchType::SWITCHED_OUT => "(event_name:ContextSwitchedOut)",
        _ => "(event_name:Invalid)",
    }
}
