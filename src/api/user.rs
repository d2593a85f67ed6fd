use axum::Json;

use crate::auth::CurrentUser;
use crate::models::UserDto;

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserDto> {
    Json(user.into())
}
