use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::{AppError, StoreError};
use crate::models::{AccountStatusChange, AccountView, CreateAccount};
use crate::store::Store;

#[derive(Debug, Serialize)]
pub struct AccountDetail {
    #[serde(flatten)]
    pub view: AccountView,
    pub summary: String,
}

pub async fn create_account(
    store: web::Data<dyn Store>,
    config: web::Data<AppConfig>,
    body: web::Json<CreateAccount>,
) -> Result<HttpResponse, AppError> {
    let new_account = body.into_inner().into_new(config.default_balance_cents)?;
    new_account.validate()?;
    let account = web::block(move || store.create_account(new_account)).await??;
    tracing::info!(
        account_id = account.id,
        holder_id = account.holder_id,
        balance = %account.balance(),
        "Opened account"
    );
    Ok(HttpResponse::Created().json(AccountView::from(account)))
}

pub async fn get_account(
    store: web::Data<dyn Store>,
    account_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let account_id = account_id.into_inner();
    let detail = web::block(move || {
        let account = store.get_account(account_id)?;
        let holder = store.get_user(account.holder_id)?;
        let summary = account.summary(&holder);
        Ok::<_, StoreError>(AccountDetail {
            view: AccountView::from(account),
            summary,
        })
    })
    .await??;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn get_holder_account(
    store: web::Data<dyn Store>,
    user_id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let user_id = user_id.into_inner();
    let account = web::block(move || store.account_for_holder(user_id)).await??;
    Ok(HttpResponse::Ok().json(AccountView::from(account)))
}

pub async fn list_accounts(store: web::Data<dyn Store>) -> Result<HttpResponse, AppError> {
    let accounts = web::block(move || store.list_accounts()).await??;
    let views: Vec<AccountView> = accounts.into_iter().map(AccountView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

pub async fn update_account_status(
    store: web::Data<dyn Store>,
    account_id: web::Path<i32>,
    body: web::Json<AccountStatusChange>,
) -> Result<HttpResponse, AppError> {
    let account_id = account_id.into_inner();
    let status = body.into_inner().status;
    let account = web::block(move || store.update_account_status(account_id, status)).await??;
    tracing::info!(account_id, status = %account.status, "Changed account status");
    Ok(HttpResponse::Ok().json(AccountView::from(account)))
}
