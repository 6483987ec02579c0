use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::models::NewUser;
use crate::store::Store;

pub async fn create_user(
    store: web::Data<dyn Store>,
    body: web::Json<NewUser>,
) -> Result<HttpResponse, AppError> {
    let new_user = body.into_inner();
    new_user.validate()?;
    let user = web::block(move || store.create_user(new_user)).await??;
    tracing::info!(user_id = user.id, "Created user");
    Ok(HttpResponse::Created().json(user))
}

pub async fn get_user(
    store: web::Data<dyn Store>,
    user_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let user_id = user_id.into_inner();
    let user = web::block(move || store.get_user(user_id)).await??;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn delete_user(
    store: web::Data<dyn Store>,
    user_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let user_id = user_id.into_inner();
    web::block(move || store.delete_user(user_id)).await??;
    tracing::info!(user_id, "Deleted user and dependent records");
    Ok(HttpResponse::NoContent().finish())
}
