//! Log tailing and the join/leave watch loop.
//!
//! Watches the server log's parent directory with `notify`, survives log
//! rotation by comparing file identity on every event, and feeds extracted
//! join/leave events to the presence store and the notifier.
//!
//! The directory-level watch is deliberate: a watch on the file path itself
//! does not survive delete+recreate on all platforms. Rotation is detected
//! by comparing the on-disk file identity against the held handle, so a
//! plain append never triggers a reopen.

mod extract;
mod tail;
mod watch;

pub use extract::{EventKind, LogEvent, extract_event};
pub use tail::{FileIdentity, TailReader};
pub use watch::{WatchError, WatchLoop};
