//! Tool availability report.

use axum::extract::State;
use axum::Json;

use crate::context::AppContext;

/// GET /api/v1/admin/tools
#[utoipa::path(
    get,
    path = "/api/v1/admin/tools",
    responses(
        (status = 200, description = "List external tool availability", body = Vec<ms_av::ToolInfo>)
    )
)]
pub async fn tools(State(ctx): State<AppContext>) -> Json<Vec<ms_av::ToolInfo>> {
    Json(ctx.tools.check_all().await)
}
