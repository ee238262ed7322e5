// CLASSIFICATION: COMMUNITY
// Filename: work.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Work items and the process identities they travel between.

use std::fmt;

use bitflags::bitflags;

/// Longest process name kept, matching the kernel task comm buffer.
pub const MAX_PROC_NAME_LEN: usize = 15;
/// Size of the interface token buffer, including the terminator.
pub const INTERFACE_TOKEN_MAX: usize = 140;
/// Bytes of parcel header preceding the UTF-16 interface token.
pub const PARCEL_TOKEN_OFFSET: usize = 16;

bitflags! {
    /// Transaction flags carried by a work item.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CallFlags: u32 {
        const ONEWAY = 0x0001;
        const ACCEPT_FDS = 0x0010;
        const VIP = 0x1000;
        const URGENT = 0x2000;
    }
}

impl CallFlags {
    /// Flags owned by the VIP policy.
    pub const PRIORITY: CallFlags = CallFlags::VIP.union(CallFlags::URGENT);
}

/// Process name in comm form. Longer names keep their trailing bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcName(String);

impl ProcName {
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        if name.len() <= MAX_PROC_NAME_LEN {
            return Self(name.to_owned());
        }
        let cut = name.len() - MAX_PROC_NAME_LEN;
        let start = name
            .char_indices()
            .map(|(i, _)| i)
            .find(|i| *i >= cut)
            .unwrap_or(name.len());
        Self(name[start..].to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ProcName {
    fn from(name: &str) -> Self {
        ProcName::new(name)
    }
}

impl From<String> for ProcName {
    fn from(name: String) -> Self {
        ProcName::new(&name)
    }
}

impl fmt::Display for ProcName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a process on either end of a call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcRef {
    pub pid: u32,
    pub uid: u32,
    pub name: ProcName,
}

impl ProcRef {
    pub fn new(pid: u32, uid: u32, name: impl Into<ProcName>) -> Self {
        Self {
            pid,
            uid,
            name: name.into(),
        }
    }
}

/// A call as it arrives from the transport, before classification.
#[derive(Debug, Clone)]
pub struct IncomingCall {
    /// Interface token hint, possibly truncated.
    pub token: String,
    pub code: u32,
    /// Flags as set by the caller.
    pub flags: CallFlags,
    pub from: ProcRef,
    pub to: ProcRef,
}

impl IncomingCall {
    pub fn new(token: impl Into<String>, code: u32, from: ProcRef, to: ProcRef) -> Self {
        Self {
            token: token.into(),
            code,
            flags: CallFlags::empty(),
            from,
            to,
        }
    }

    pub fn with_flags(mut self, flags: CallFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Sequence number assigned by the host pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkId(pub u64);

/// A classified unit of work. Flags are fixed once the item exists.
#[derive(Debug, Clone)]
pub struct WorkItem {
    id: WorkId,
    token: String,
    code: u32,
    flags: CallFlags,
    from: ProcRef,
    to: ProcRef,
}

impl WorkItem {
    pub fn new(id: WorkId, call: IncomingCall, flags: CallFlags) -> Self {
        Self {
            id,
            token: call.token,
            code: call.code,
            flags,
            from: call.from,
            to: call.to,
        }
    }

    pub fn id(&self) -> WorkId {
        self.id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn flags(&self) -> CallFlags {
        self.flags
    }

    pub fn is_vip(&self) -> bool {
        self.flags.contains(CallFlags::VIP)
    }

    pub fn caller(&self) -> &ProcRef {
        &self.from
    }

    pub fn target(&self) -> &ProcRef {
        &self.to
    }
}

/// Recover the interface token from a serialized parcel.
///
/// The token follows a fixed header as UTF-16; only the low byte of each
/// unit is kept. Reading stops at a NUL unit or when the bounded buffer
/// runs out.
pub fn token_from_parcel(data: &[u8]) -> String {
    let data = &data[..data.len().min(INTERFACE_TOKEN_MAX)];
    if data.len() <= PARCEL_TOKEN_OFFSET {
        return String::new();
    }
    data[PARCEL_TOKEN_OFFSET..]
        .chunks_exact(2)
        .map(|unit| unit[0])
        .take_while(|b| *b != 0)
        .map(char::from)
        .collect()
}
