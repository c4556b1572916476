use bookstore_api::{
    config::DEFAULT_DATABASE_URL,
    db::{OrmConn, create_orm_conn, run_migrations},
    entity::{
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    services::auth_service::hash_password,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let orm = create_orm_conn(&database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let admin_password =
        std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
    let user_password =
        std::env::var("SEED_USER_PASSWORD").unwrap_or_else(|_| "user123".to_string());

    let admin_id = ensure_user(&orm, "Administrator", "admin@books.ru", &admin_password, true).await?;
    let user_id = ensure_user(&orm, "Regular user", "user@books.ru", &user_password, false).await?;
    seed_products(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &OrmConn,
    name: &str,
    email: &str,
    password: &str,
    is_admin: bool,
) -> anyhow::Result<Uuid> {
    // If user already exists, keep it untouched
    if let Some(existing) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("User {email} already present");
        return Ok(existing.id);
    }

    let password_hash = hash_password(password)?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        is_admin: Set(is_admin),
        created_at: Set(Utc::now()),
    }
    .insert(orm)
    .await?;

    println!("Ensured user {email} (admin={is_admin})");
    Ok(user.id)
}

async fn seed_products(orm: &OrmConn) -> anyhow::Result<()> {
    let products = vec![
        ("War and Peace", "Leo Tolstoy's epic novel", 1500.0),
        ("Crime and Punishment", "A novel by Fyodor Dostoevsky", 1200.0),
        ("The Master and Margarita", "A novel by Mikhail Bulgakov", 1300.0),
        ("Eugene Onegin", "Alexander Pushkin's novel in verse", 1100.0),
    ];

    for (name, desc, price) in products {
        let present = Products::find()
            .filter(ProdCol::Name.eq(name))
            .count(orm)
            .await?;
        if present > 0 {
            continue;
        }

        ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(Some(desc.to_string())),
            price: Set(price),
            created_at: Set(Utc::now()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
