pub mod uploader;

pub use uploader::UploaderId;
