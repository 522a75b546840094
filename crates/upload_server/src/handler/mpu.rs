mod abort_multipart_upload;
mod complete_multipart_upload;
mod create_multipart_upload;

pub use abort_multipart_upload::{AbortUploadRequest, abort_multipart_upload_handler};
pub use complete_multipart_upload::{
    CompleteUploadRequest, CompletedPartRequest, complete_multipart_upload_handler,
};
pub use create_multipart_upload::{
    CreateUploadRequest, CreateUploadResponse, create_multipart_upload_handler,
};
