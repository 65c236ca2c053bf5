use crate::application::group_service::GroupService;
use crate::domain::error::DomainError;
use actix_web::{HttpResponse, get, web};

#[get("/groups")]
async fn list_groups(groups: web::Data<GroupService>) -> Result<HttpResponse, DomainError> {
    Ok(HttpResponse::Ok().json(groups.list().await?))
}
