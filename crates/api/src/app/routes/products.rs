use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};

use stockroom_core::{CategoryId, ProductId};
use stockroom_products::{rules, NewProduct, ProductOrder, ProductQuery, ProductUpdate};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::params::RequestParams;
use crate::app::routes::common;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route(
            "/",
            get(list_products)
                .post(create_product)
                .put(update_product)
                .patch(update_product)
                .delete(delete_product),
        )
        .route(
            "/categories",
            get(list_categories)
                .post(create_category)
                .put(update_category)
                .delete(delete_category),
        )
        .route("/list", get(list_products_minified))
        .route("/stock", patch(adjust_stock))
        .route("/:id", get(get_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    RequestParams(params): RequestParams,
) -> Result<Json<dto::ProductList>, ApiError> {
    let query = ProductQuery {
        search: params.str_or("search", ""),
        order: params.str_or("order", ProductOrder::default().as_str()),
        category_id: params.i64_or("category_id", 0),
        offset: params.i64_or("offset", 0),
    };

    let page = services.products.get_products(query).await?;
    Ok(Json(page.into()))
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(services.products.get_product_categories().await?))
}

pub async fn list_products_minified(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(services.products.get_products_list().await?))
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = ProductId::new(common::path_id(&id)?);
    let product = services
        .products
        .get_product_by_id(id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(product))
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    RequestParams(params): RequestParams,
) -> Result<Json<dto::Deleted>, ApiError> {
    common::validate(rules::delete_product(), &params, services.lookup.as_ref()).await?;

    let id = ProductId::new(common::integer(&params, "product_id")?);
    let deleted = services.products.delete_product_by_id(id).await?;
    Ok(Json(dto::Deleted { deleted }))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    RequestParams(params): RequestParams,
) -> Result<impl IntoResponse, ApiError> {
    common::validate(rules::create_product(), &params, services.lookup.as_ref()).await?;

    let product = NewProduct {
        name: common::text(&params, "name")?,
        category_id: CategoryId::new(common::integer(&params, "category_id")?),
        sell_price: common::number(&params, "sell_price")?,
        buy_price: common::number(&params, "buy_price")?,
        stock: common::stock(&params),
    };

    let created = services.products.post_product(product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    RequestParams(params): RequestParams,
) -> Result<impl IntoResponse, ApiError> {
    common::validate(rules::update_product(), &params, services.lookup.as_ref()).await?;

    let update = ProductUpdate {
        product_id: ProductId::new(common::integer(&params, "product_id")?),
        name: common::text(&params, "name")?,
        category_id: CategoryId::new(common::integer(&params, "category_id")?),
        sell_price: common::number(&params, "sell_price")?,
        buy_price: common::number(&params, "buy_price")?,
        stock: common::stock(&params),
    };

    Ok(Json(services.products.update_product(update).await?))
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    RequestParams(mut params): RequestParams,
) -> Result<impl IntoResponse, ApiError> {
    // Older clients send the misspelled `ammount`.
    if params.is_blank("amount") {
        if let Some(legacy) = params.get("ammount").cloned() {
            params.insert("amount", legacy);
        }
    }
    common::validate(rules::adjust_stock(), &params, services.lookup.as_ref()).await?;

    let id = ProductId::new(common::integer(&params, "product_id")?);
    let amount = common::integer(&params, "amount")?;
    Ok(Json(services.products.update_product_stock(id, amount).await?))
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    RequestParams(params): RequestParams,
) -> Result<impl IntoResponse, ApiError> {
    common::validate(rules::create_category(), &params, services.lookup.as_ref()).await?;

    let name = common::text(&params, "name")?;
    let created = services.products.post_product_category(name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    RequestParams(params): RequestParams,
) -> Result<impl IntoResponse, ApiError> {
    let own_id = params.integer("category_id");
    common::validate(rules::update_category(own_id), &params, services.lookup.as_ref()).await?;

    let name = common::text(&params, "name")?;
    let id = CategoryId::new(common::integer(&params, "category_id")?);
    Ok(Json(services.products.update_product_category(name, id).await?))
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    RequestParams(params): RequestParams,
) -> Result<Json<dto::Deleted>, ApiError> {
    common::validate(rules::delete_category(), &params, services.lookup.as_ref()).await?;

    let id = CategoryId::new(common::integer(&params, "category_id")?);
    let deleted = services.products.delete_product_category_by_id(id).await?;
    Ok(Json(dto::Deleted { deleted }))
}
