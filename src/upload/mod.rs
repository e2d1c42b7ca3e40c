mod transfer;
mod types;

pub use transfer::TransferController;
pub use types::{FileStatus, UploadStatus, UploadSummary};
