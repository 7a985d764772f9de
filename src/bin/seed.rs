use chrono::Utc;
use ecocart_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        products::{self, ActiveModel as ProductActive, Entity as Products},
        users::{self, Entity as Users},
    },
    models::{Category, RecycleMethod, Role},
    services::auth_service::{NewAccount, create_account},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url, 1).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "admin@example.com", "admin123", Role::Admin).await?;
    let seller_id = ensure_user(&orm, "seller@example.com", "seller123", Role::Seller).await?;
    let user_id = ensure_user(&orm, "user@example.com", "user123", Role::User).await?;
    seed_products(&orm, seller_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, Seller ID: {seller_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("User {email} already present");
        return Ok(existing.id);
    }

    let user = create_account(
        orm,
        NewAccount {
            first_name: role.as_str().to_string(),
            last_name: "Demo".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            address: None,
            role,
        },
    )
    .await?;

    println!("Ensured user {email} (role={})", role.as_str());
    Ok(user.id)
}

async fn seed_products(orm: &DatabaseConnection, seller_id: Uuid) -> anyhow::Result<()> {
    let catalog = [
        ("Solar Power Bank", "10 000 mAh bank with a solar panel", 3499, Category::Electronics, RecycleMethod::Metal, 5),
        ("Glass Food Jars", "Set of four airtight jars", 1899, Category::Storage, RecycleMethod::Glass, 4),
        ("Bamboo Toothbrush", "Compostable handle, soft bristles", 399, Category::Consumables, RecycleMethod::Compostable, 4),
        ("Kraft Paper Tape", "Plastic-free packing tape", 599, Category::Consumables, RecycleMethod::Paper, 3),
    ];

    for (name, description, price, category, recycle_method, rating) in catalog {
        let exists = Products::find()
            .filter(products::Column::Name.eq(name))
            .one(orm)
            .await?;
        if exists.is_some() {
            continue;
        }

        ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(description.to_string()),
            price: Set(price),
            image_url: Set(format!("/images/{}.jpg", name.to_lowercase().replace(' ', "-"))),
            category: Set(category),
            recycle_method: Set(recycle_method),
            rating: Set(Some(rating)),
            seller_id: Set(seller_id),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
