//! Domain models and request/response DTOs.

pub mod download_request;
pub mod file;
pub mod user;

pub use download_request::{
    CreateDownloadRequest, DownloadRequest, DownloadRequestRecord, RequestCheck, RequestStatus,
    TransitionError, UpdateDownloadRequest,
};
pub use file::{FeaturedImage, FileRecord, StoredFile, UpdateFileRequest};
pub use user::{
    AdminRegisterRequest, AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, Role,
    User, UserResponse,
};
