mod common;

use bookstore_api::{
    dto::products::{CreateProductRequest, UpdateProductRequest},
    error::AppError,
    services::product_service::{
        create_product, delete_product, get_product, list_products, update_product,
    },
};
use common::{admin, seed_product, setup_state};
use uuid::Uuid;

#[tokio::test]
async fn admin_creates_and_reads_back_a_product() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = admin(&state).await?;

    let created = create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: "  Master and Margarita ".into(),
            description: Some("Bulgakov".into()),
            price: 1500.0,
        },
    )
    .await?;
    assert_eq!(created.name, "Master and Margarita");

    let fetched = get_product(&state, created.id).await?;
    assert_eq!(fetched, created);
    Ok(())
}

#[tokio::test]
async fn negative_price_is_rejected_and_nothing_is_stored() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = admin(&state).await?;

    let result = create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: "Bad".into(),
            description: None,
            price: -5.0,
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(list_products(&state).await?.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn partial_update_keeps_omitted_fields() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = admin(&state).await?;
    let product = seed_product(&state, "War and Peace", 2000.0).await?;

    let updated = update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            price: Some(1800.0),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(updated.price, 1800.0);
    assert_eq!(updated.name, "War and Peace");
    assert_eq!(updated.description, product.description);

    let invalid = update_product(
        &state,
        &admin,
        product.id,
        UpdateProductRequest {
            name: Some("Renamed".into()),
            price: Some(-1.0),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(invalid, Err(AppError::Validation(_))));
    assert_eq!(get_product(&state, product.id).await?.name, "War and Peace");
    Ok(())
}

#[tokio::test]
async fn unknown_ids_are_not_found() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = admin(&state).await?;
    let missing = Uuid::new_v4();

    assert!(matches!(
        get_product(&state, missing).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        update_product(&state, &admin, missing, UpdateProductRequest::default()).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        delete_product(&state, &admin, missing).await,
        Err(AppError::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn delete_removes_only_the_target() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = admin(&state).await?;
    let kept = seed_product(&state, "Crime and Punishment", 1200.0).await?;
    let doomed = seed_product(&state, "Dead Souls", 900.0).await?;

    let deleted = delete_product(&state, &admin, doomed.id).await?;
    assert_eq!(deleted.id, doomed.id);

    let remaining = list_products(&state).await?.items;
    assert_eq!(remaining, vec![kept]);
    assert!(matches!(
        get_product(&state, doomed.id).await,
        Err(AppError::NotFound(_))
    ));
    Ok(())
}
