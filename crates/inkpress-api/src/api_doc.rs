//! OpenAPI documentation for the HTTP surface.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use inkpress_core::models;
use inkpress_core::pagination;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inkpress API",
        version = "0.1.0",
        description = "Blog content backend with gated file downloads. Uploaded files can be attached to posts; non-admin downloads go through an approval workflow (request, admin decision, download)."
    ),
    paths(
        // Auth
        handlers::auth::login,
        handlers::auth::register,
        handlers::auth::admin_register,
        handlers::auth::profile,
        handlers::auth::change_password,
        handlers::auth::users_count,
        // Files
        handlers::file_upload::upload_file,
        handlers::file_upload::upload_featured_image,
        handlers::files::list_files,
        handlers::files::get_file,
        handlers::files::update_file,
        handlers::files::delete_file,
        handlers::file_download::download_file,
        // Download requests
        handlers::download_requests::create_download_request,
        handlers::download_requests::check_download_request,
        handlers::download_requests::my_requests,
        handlers::download_requests::list_download_requests,
        handlers::download_requests::get_download_request,
        handlers::download_requests::update_download_request,
        handlers::download_requests::delete_download_request,
    ),
    components(schemas(
        error::ErrorResponse,
        models::Role,
        models::UserResponse,
        models::AuthResponse,
        models::LoginRequest,
        models::RegisterRequest,
        models::AdminRegisterRequest,
        models::ChangePasswordRequest,
        models::StoredFile,
        models::FileRecord,
        models::UpdateFileRequest,
        models::FeaturedImage,
        models::RequestStatus,
        models::DownloadRequest,
        models::DownloadRequestRecord,
        models::CreateDownloadRequest,
        models::UpdateDownloadRequest,
        models::RequestCheck,
        pagination::Pagination,
        handlers::MessageResponse,
        handlers::auth::UserCountResponse,
        handlers::files::FileListResponse,
        handlers::files::FileEnvelope,
        handlers::file_upload::FeaturedImageEnvelope,
        handlers::file_download::DownloadRefusal,
        handlers::download_requests::RequestListResponse,
        handlers::download_requests::RequestEnvelope,
        handlers::download_requests::RequestResponse,
    )),
    tags(
        (name = "auth", description = "Authentication and accounts"),
        (name = "files", description = "Upload registry and downloads"),
        (name = "download-requests", description = "Download-request ledger")
    )
)]
pub struct ApiDoc;
