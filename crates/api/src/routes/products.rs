//! Product catalog endpoints, with read-through caching on lookup and search.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use cache::keys;
use common::{CategoryId, Money, ProductId};
use domain::Product;
use fulfillment::PaymentGateway;
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::routes::orders::AppState;
use crate::routes::parse_uuid;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    pub stock: u32,
    pub category_id: Option<String>,
}

/// PUT body. Replaces every catalog field; stock is deliberately absent
/// because it only moves through the inventory ledger.
#[derive(Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    pub available: bool,
    pub category_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: u32,
    pub available: bool,
    pub category_id: Option<String>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        ProductResponse {
            id: product.id.to_string(),
            name: product.name,
            description: product.description,
            price_cents: product.price.cents(),
            stock: product.stock,
            available: product.available,
            category_id: product.category_id.map(|id| id.to_string()),
        }
    }
}

fn parse_category_id(id: &Option<String>) -> Result<Option<CategoryId>, ApiError> {
    id.as_deref()
        .map(|s| parse_uuid(s).map(CategoryId::from_uuid))
        .transpose()
}

// -- Handlers --

/// POST /products — add a product to the catalog.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let category_id = parse_category_id(&req.category_id)?;
    let product = Product::new(
        req.name,
        req.description,
        Money::from_cents(req.price_cents),
        req.stock,
        category_id,
    );

    state.store.insert_product(product.clone()).await?;
    state.cache.invalidate_product(product.id).await;

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// GET /products/:id — read-through cached product lookup.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id = ProductId::from_uuid(parse_uuid(&id)?);

    let product = state
        .cache
        .products
        .get_or_load(&keys::product(product_id), || async {
            state
                .store
                .get_product(product_id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))
        })
        .await?;

    Ok(Json(product.into()))
}

/// GET /products — list the whole catalog, uncached.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.store.list_products().await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /products/search?q= — cached substring search over available products.
#[tracing::instrument(skip(state))]
pub async fn search<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let results = state
        .cache
        .search
        .get_or_load(&keys::search(&params.q), || async {
            state
                .store
                .search_products(&params.q)
                .await
                .map_err(ApiError::from)
        })
        .await?;

    Ok(Json(results.into_iter().map(Into::into).collect()))
}

/// PUT /products/:id — replace catalog fields. The stored stock value is
/// preserved by the store.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id = ProductId::from_uuid(parse_uuid(&id)?);
    let category_id = parse_category_id(&req.category_id)?;

    let product = Product {
        id: product_id,
        name: req.name,
        description: req.description,
        price: Money::from_cents(req.price_cents),
        stock: 0, // ignored; the store keeps the committed value
        available: req.available,
        category_id,
    };

    let updated = state.store.update_product(product).await?;
    state.cache.invalidate_product(product_id).await;

    Ok(Json(updated.into()))
}

/// DELETE /products/:id — remove a product from the catalog.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let product_id = ProductId::from_uuid(parse_uuid(&id)?);

    state.store.delete_product(product_id).await?;
    state.cache.invalidate_product(product_id).await;

    Ok(StatusCode::NO_CONTENT)
}
