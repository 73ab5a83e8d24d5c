//! Compilers combine probes into the records served by the API.

pub mod activity;
pub mod backups;
pub mod notify;
pub mod snapshot;
pub mod storage;
pub mod users;

pub use activity::{
    line_limit,
    log_view,
    recent_syncs,
    sync_chart,
    LogView,
    SyncRecord,
};
pub use backups::{
    Archive,
    BackupGateway,
    BackupRecord,
    DownloadError,
};
pub use notify::{
    send_notification,
    DEFAULT_TEST_MESSAGE,
};
pub use snapshot::{
    StatusReport,
    StatusSnapshot,
};
pub use storage::{
    StorageBreakdown,
    StorageReport,
};
pub use users::{
    compile_users,
    CollectionDetails,
    CollectionRecord,
    UserRecord,
};
