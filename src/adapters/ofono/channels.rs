//! Notice channel between the gateway tasks and the event loop.
//!
//! Uses an `embassy-sync` bounded channel.  Gateway tasks and the event
//! loop run on the same local executor, so the channel is shared through
//! an `Rc` and needs no locking.
//!
//! ```text
//! ┌──────────────┐    Notice    ┌──────────────┐
//! │ gateway task │─────────────▶│  event loop  │
//! │  (per call)  │              │ (Provisioner)│
//! └──────────────┘              └──────────────┘
//! ```
//!
//! A full channel parks the sending task until the loop catches up.

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;

use crate::events::Notice;

/// Channel depth for notices.
pub const NOTICE_DEPTH: usize = 32;

/// Gateway tasks → event loop.
pub type NoticeChannel = Channel<NoopRawMutex, Notice, NOTICE_DEPTH>;

pub fn notice_channel() -> NoticeChannel {
    Channel::new()
}
