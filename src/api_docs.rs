use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::auth::signup,
        api::auth::login,
        api::user::get_me,
        api::sector::list_sectors,
        api::sector::create_sector,
        api::badge::list_badges,
        // Add other endpoints here as we document them
    ),
    tags(
        (name = "ascend", description = "Ascend personal development API")
    )
)]
pub struct ApiDoc;
