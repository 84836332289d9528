use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockroom_contacts::{rules, ContactOrder, ContactQuery, ContactUpdate, NewContact, ROLE_CUSTOMER};
use stockroom_core::ContactId;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::params::RequestParams;
use crate::app::routes::common;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route(
            "/",
            get(list_contacts)
                .post(create_contact)
                .put(update_contact)
                .patch(update_contact)
                .delete(delete_contact),
        )
        .route("/minified", get(list_contacts_minified))
        .route("/:id", get(get_contact))
}

pub async fn list_contacts(
    Extension(services): Extension<Arc<AppServices>>,
    RequestParams(params): RequestParams,
) -> Result<Json<dto::ContactList>, ApiError> {
    let query = ContactQuery {
        offset: params.i64_or("offset", 0),
        search: params.str_or("search", ""),
        role: params.str_or("role", ROLE_CUSTOMER),
        order: params.str_or("order", ContactOrder::default().as_str()),
    };

    let page = services.contacts.get_contacts(query).await?;
    Ok(Json(page.into()))
}

pub async fn list_contacts_minified(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(services.contacts.get_contacts_minified().await?))
}

pub async fn get_contact(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = ContactId::new(common::path_id(&id)?);
    let contact = services
        .contacts
        .get_contact_by_id(id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(contact))
}

pub async fn delete_contact(
    Extension(services): Extension<Arc<AppServices>>,
    RequestParams(params): RequestParams,
) -> Result<Json<dto::Deleted>, ApiError> {
    common::validate(rules::delete_contact(), &params, services.lookup.as_ref()).await?;

    let id = ContactId::new(common::integer(&params, "contact_id")?);
    let deleted = services.contacts.delete_contact_by_id(id).await?;
    Ok(Json(dto::Deleted { deleted }))
}

pub async fn create_contact(
    Extension(services): Extension<Arc<AppServices>>,
    RequestParams(params): RequestParams,
) -> Result<impl IntoResponse, ApiError> {
    common::validate(rules::create_contact(), &params, services.lookup.as_ref()).await?;

    let contact = NewContact {
        name: common::text(&params, "name")?,
        phone: common::text(&params, "phone")?,
        role: common::text(&params, "role")?,
        money: common::number(&params, "money")?,
        address: common::text(&params, "address")?,
    };

    let created = services.contacts.post_contact(contact).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_contact(
    Extension(services): Extension<Arc<AppServices>>,
    RequestParams(params): RequestParams,
) -> Result<impl IntoResponse, ApiError> {
    let own_id = params.integer("contact_id");
    common::validate(rules::update_contact(own_id), &params, services.lookup.as_ref()).await?;

    let update = ContactUpdate {
        contact_id: ContactId::new(common::integer(&params, "contact_id")?),
        name: common::text(&params, "name")?,
        phone: common::text(&params, "phone")?,
        address: common::text(&params, "address")?,
        money: common::number(&params, "money")?,
    };

    Ok(Json(services.contacts.update_contact(update).await?))
}
