use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    config::{StatusPolicy, TotalPolicy},
    dto::orders::{CartLine, CreateOrderRequest, OrderCreated, OrderList, UpdateOrderStatusRequest},
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::Entity as Products,
        users::Model as UserModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AdminUser, AuthUser},
    models::{Order, OrderItem, OrderStatus},
    services::auth_service::find_account,
    state::AppState,
};

/// Allowed gap between a declared total and the line sum under [`TotalPolicy::Verify`].
const TOTAL_TOLERANCE: f64 = 0.005;

/// Contact details frozen onto the order at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Customer {
    name: String,
    email: String,
    phone: String,
    shipping_address: String,
}

impl Customer {
    fn resolve(payload: &CreateOrderRequest, account: &UserModel) -> Self {
        Self {
            name: provided(&payload.customer_name).unwrap_or_else(|| account.name.clone()),
            email: provided(&payload.customer_email).unwrap_or_else(|| account.email.clone()),
            phone: provided(&payload.customer_phone).unwrap_or_default(),
            shipping_address: provided(&payload.shipping_address).unwrap_or_default(),
        }
    }
}

fn provided(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<OrderCreated> {
    let account = find_account(&state.orm, user.user_id).await?;
    validate_cart(&payload.items, payload.total_amount, state.order_policy.total)?;
    let customer = Customer::resolve(&payload, &account);

    let txn = state
        .orm
        .begin()
        .await
        .map_err(AppError::OrderCreationFailed)?;

    let written = insert_order(
        &txn,
        account.id,
        &customer,
        payload.total_amount,
        &payload.items,
    )
    .await;

    let order_id = match written {
        Ok(order_id) => order_id,
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!(error = %rollback_err, "order rollback failed");
            }
            return Err(AppError::OrderCreationFailed(err));
        }
    };
    txn.commit().await.map_err(AppError::OrderCreationFailed)?;

    tracing::info!(
        order_id = %order_id,
        user_id = %account.id,
        items = payload.items.len(),
        "order created"
    );
    Ok(OrderCreated { order_id })
}

/// Writes the header and every line. Must run inside a transaction.
async fn insert_order<C>(
    conn: &C,
    user_id: Uuid,
    customer: &Customer,
    total_amount: f64,
    lines: &[CartLine],
) -> Result<Uuid, DbErr>
where
    C: ConnectionTrait,
{
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        created_at: Set(Utc::now()),
        customer_name: Set(customer.name.clone()),
        customer_email: Set(customer.email.clone()),
        customer_phone: Set(customer.phone.clone()),
        shipping_address: Set(customer.shipping_address.clone()),
    }
    .insert(conn)
    .await?;

    for (position, line) in lines.iter().enumerate() {
        // Price and quantity are stored verbatim; the product FK is left to the store.
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(line.product_id)),
            quantity: Set(line.quantity),
            price: Set(line.price),
            position: Set(i32::try_from(position).unwrap_or(i32::MAX)),
        }
        .insert(conn)
        .await?;
    }

    Ok(order.id)
}

pub fn validate_cart(lines: &[CartLine], total_amount: f64, policy: TotalPolicy) -> AppResult<()> {
    if lines.is_empty() {
        return Err(AppError::validation("Cart is empty"));
    }
    for line in lines {
        if line.quantity <= 0 {
            return Err(AppError::validation(format!(
                "Quantity for product {} must be positive",
                line.product_id
            )));
        }
        if !line.price.is_finite() || line.price < 0.0 {
            return Err(AppError::validation(format!(
                "Price for product {} must be a finite, non-negative number",
                line.product_id
            )));
        }
    }
    if !total_amount.is_finite() || total_amount < 0.0 {
        return Err(AppError::validation(
            "Total amount must be a finite, non-negative number",
        ));
    }

    if policy == TotalPolicy::Verify {
        let expected: f64 = lines
            .iter()
            .map(|line| line.price * f64::from(line.quantity))
            .sum();
        if (expected - total_amount).abs() > TOTAL_TOLERANCE {
            return Err(AppError::validation(format!(
                "Total amount {total_amount} does not match cart total {expected}"
            )));
        }
    }

    Ok(())
}

pub async fn list_orders(state: &AppState, admin: &AdminUser) -> AppResult<OrderList> {
    let orders = Orders::find()
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    if orders.is_empty() {
        return Ok(OrderList { items: Vec::new() });
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .order_by_asc(OrderItemCol::Position)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for (item, product) in rows {
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(OrderItem {
                id: item.id,
                product_id: item.product_id,
                product_name: product.map(|p| p.name),
                quantity: item.quantity,
                price: item.price,
                total: item.price * f64::from(item.quantity),
            });
    }

    let items = orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            order_from_entity(order, items)
        })
        .collect::<Vec<_>>();

    tracing::debug!(admin_id = %admin.user_id(), count = items.len(), "orders listed");
    Ok(OrderList { items })
}

pub async fn update_order_status(
    state: &AppState,
    admin: &AdminUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<()> {
    let status = check_status(&payload.status, state.order_policy.status)?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::not_found("Order not found")),
    };

    let previous = existing.status.clone();
    let mut active: OrderActive = existing.into();
    active.status = Set(status);
    let order = active.update(&state.orm).await?;

    tracing::info!(
        order_id = %order.id,
        admin_id = %admin.user_id(),
        from = %previous,
        to = %order.status,
        "order status updated"
    );
    Ok(())
}

/// Lenient mode stores any non-empty value as sent; strict mode admits only known statuses.
pub fn check_status(raw: &str, policy: StatusPolicy) -> AppResult<String> {
    if raw.trim().is_empty() {
        return Err(AppError::validation("Status is required"));
    }
    match policy {
        StatusPolicy::Lenient => Ok(raw.to_string()),
        StatusPolicy::Strict => raw
            .parse::<OrderStatus>()
            .map(|status| status.as_str().to_string())
            .map_err(|_| {
                AppError::validation("Status must be one of: pending, completed, cancelled")
            }),
    }
}

fn order_from_entity(model: OrderModel, items: Vec<OrderItem>) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        total_amount: model.total_amount,
        status: model.status,
        created_at: model.created_at,
        customer_name: model.customer_name,
        customer_email: model.customer_email,
        customer_phone: model.customer_phone,
        shipping_address: model.shipping_address,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i32, price: f64) -> CartLine {
        CartLine {
            product_id: Uuid::new_v4(),
            quantity,
            price,
        }
    }

    fn account() -> UserModel {
        UserModel {
            id: Uuid::new_v4(),
            name: "Reader".into(),
            email: "reader@books.ru".into(),
            password_hash: "x".into(),
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    fn request(name: Option<&str>, email: Option<&str>) -> CreateOrderRequest {
        CreateOrderRequest {
            items: vec![line(1, 10.0)],
            total_amount: 10.0,
            customer_name: name.map(str::to_string),
            customer_email: email.map(str::to_string),
            customer_phone: None,
            shipping_address: Some("Moscow, Tverskaya 1".into()),
        }
    }

    #[test]
    fn omitted_customer_fields_fall_back_to_the_account() {
        let customer = Customer::resolve(&request(None, Some("  ")), &account());
        assert_eq!(customer.name, "Reader");
        assert_eq!(customer.email, "reader@books.ru");
        assert_eq!(customer.phone, "");
        assert_eq!(customer.shipping_address, "Moscow, Tverskaya 1");

        let customer = Customer::resolve(&request(Some("Gift"), None), &account());
        assert_eq!(customer.name, "Gift");
    }

    #[test]
    fn cart_lines_are_checked_before_any_write() {
        let trust = TotalPolicy::Trust;
        assert!(validate_cart(&[], 0.0, trust).is_err());
        assert!(validate_cart(&[line(0, 10.0)], 0.0, trust).is_err());
        assert!(validate_cart(&[line(-2, 10.0)], 0.0, trust).is_err());
        assert!(validate_cart(&[line(1, -1.0)], 0.0, trust).is_err());
        assert!(validate_cart(&[line(1, 10.0)], f64::NAN, trust).is_err());
        assert!(validate_cart(&[line(2, 10.0), line(3, 5.0)], 35.0, trust).is_ok());
    }

    #[test]
    fn declared_total_is_trusted_unless_verification_is_on() {
        let lines = [line(2, 1500.0), line(1, 1200.0)];
        assert!(validate_cart(&lines, 1.0, TotalPolicy::Trust).is_ok());
        assert!(matches!(
            validate_cart(&lines, 1.0, TotalPolicy::Verify),
            Err(AppError::Validation(_))
        ));
        assert!(validate_cart(&lines, 4200.0, TotalPolicy::Verify).is_ok());
    }

    #[test]
    fn lenient_status_accepts_anything_non_empty() {
        assert_eq!(
            check_status("bogus", StatusPolicy::Lenient).expect("lenient"),
            "bogus"
        );
        assert!(check_status("  ", StatusPolicy::Lenient).is_err());
    }

    #[test]
    fn strict_status_admits_only_known_values() {
        assert_eq!(
            check_status("completed", StatusPolicy::Strict).expect("strict"),
            "completed"
        );
        assert!(matches!(
            check_status("bogus", StatusPolicy::Strict),
            Err(AppError::Validation(_))
        ));
    }
}
