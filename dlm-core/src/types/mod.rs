mod primitives;
mod record;

pub use primitives::{RELEASE_CODE_LEN, ReleaseCode};
pub use record::{LockRecord, MAX_EXPIRES, WriteOutcome};
