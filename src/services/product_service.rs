use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::products::{CreateProductRequest, DeletedProduct, ProductList, UpdateProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products},
    error::{AppError, AppResult},
    middleware::auth::AdminUser,
    models::Product,
    state::AppState,
};

const PRODUCT_NOT_FOUND: &str = "Product not found";

pub async fn list_products(state: &AppState) -> AppResult<ProductList> {
    let items = Products::find()
        .order_by_asc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();
    Ok(ProductList { items })
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<Product> {
    Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Product::from)
        .ok_or_else(|| AppError::not_found(PRODUCT_NOT_FOUND))
}

pub async fn create_product(
    state: &AppState,
    admin: &AdminUser,
    payload: CreateProductRequest,
) -> AppResult<Product> {
    let name = validate_name(&payload.name)?;
    validate_price(payload.price)?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        price: Set(payload.price),
        created_at: Set(Utc::now()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(
        product_id = %product.id,
        admin_id = %admin.user_id(),
        "product created"
    );
    Ok(product.into())
}

pub async fn update_product(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<Product> {
    // Validate before the lookup so a bad payload never half-applies.
    let name = payload.name.as_deref().map(validate_name).transpose()?;
    if let Some(price) = payload.price {
        validate_price(price)?;
    }

    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::not_found(PRODUCT_NOT_FOUND)),
    };

    let mut active: ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }

    let product = active.update(&state.orm).await?;

    tracing::info!(
        product_id = %product.id,
        admin_id = %admin.user_id(),
        "product updated"
    );
    Ok(product.into())
}

pub async fn delete_product(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
) -> AppResult<DeletedProduct> {
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found(PRODUCT_NOT_FOUND));
    }

    tracing::info!(product_id = %id, admin_id = %admin.user_id(), "product deleted");
    Ok(DeletedProduct { id })
}

pub fn validate_price(price: f64) -> AppResult<()> {
    if price.is_finite() && price >= 0.0 {
        Ok(())
    } else {
        Err(AppError::validation(
            "Price must be a finite, non-negative number",
        ))
    }
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Product name is required"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_must_be_finite_and_non_negative() {
        assert!(validate_price(0.0).is_ok());
        assert!(validate_price(1500.0).is_ok());
        assert!(matches!(validate_price(-5.0), Err(AppError::Validation(_))));
        assert!(validate_price(f64::NAN).is_err());
        assert!(validate_price(f64::INFINITY).is_err());
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(validate_name("   ").is_err());
        assert_eq!(validate_name(" Dune ").expect("name"), "Dune");
    }
}
