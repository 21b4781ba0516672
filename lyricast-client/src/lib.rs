pub mod catalog;
pub mod error;
pub mod push;

pub use catalog::{
    CatalogClient, IngestReceipt, SongDetails, SongSummary, UploadReceipt, UploadRequest,
};
pub use error::ClientError;
pub use push::PushListener;
