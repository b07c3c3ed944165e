use sea_orm::*;

use crate::domain::{DomainError, Role};
use crate::infrastructure::auth::{generate_password, hash_password};
use crate::models::{product, stock_entry, supplier, user};

pub const BOOTSTRAP_ADMIN: &str = "admin";
const BOOTSTRAP_EMAIL: &str = "admin@ledblast.local";

/// Create the first Admin when the users table is empty.
/// Returns the generated password when one had to be made up.
pub async fn ensure_admin(
    db: &DatabaseConnection,
    password: Option<&str>,
) -> Result<Option<String>, DomainError> {
    if user::Entity::find().count(db).await? > 0 {
        return Ok(None);
    }

    let (password, generated) = match password {
        Some(p) => (p.to_string(), false),
        None => (generate_password(), true),
    };

    user::ActiveModel {
        username: Set(BOOTSTRAP_ADMIN.to_owned()),
        email: Set(BOOTSTRAP_EMAIL.to_owned()),
        password_hash: Set(hash_password(&password)?),
        role: Set(Role::Admin.as_str().to_owned()),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("👤 Created bootstrap admin account '{}'", BOOTSTRAP_ADMIN);
    Ok(generated.then_some(password))
}

struct DemoProduct {
    sku: &'static str,
    name: &'static str,
    category: &'static str,
    price: f64,
    threshold: i32,
    restock: i32,
}

const DEMO_SUPPLIERS: &[(&str, &str, &str)] = &[
    ("Shenzhen Bright LED Co.", "Shenzhen", "Li Wei"),
    ("Guangzhou Display Tech", "Guangzhou", "Chen Jing"),
    ("Ningbo Lighting Works", "Ningbo", "Zhang Min"),
];

const DEMO_PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        sku: "LED-P10-OUT",
        name: "P10 Outdoor LED Module",
        category: "LED Modules",
        price: 42.5,
        threshold: 20,
        restock: 50,
    },
    DemoProduct {
        sku: "LCD-55-4K",
        name: "55\" 4K LCD Panel",
        category: "LCD Panels",
        price: 1890.0,
        threshold: 5,
        restock: 3,
    },
    DemoProduct {
        sku: "PSU-5V-40A",
        name: "5V 40A Power Supply",
        category: "Power Supplies",
        price: 65.0,
        threshold: 10,
        restock: 8,
    },
];

/// Demo catalogue for a fresh database. Skipped when suppliers already exist.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DomainError> {
    if supplier::Entity::find().count(db).await? > 0 {
        tracing::debug!("Catalogue not empty, skipping demo seed");
        return Ok(());
    }

    let now = chrono::Utc::now().to_rfc3339();
    let txn = db.begin().await?;

    let mut supplier_ids = Vec::with_capacity(DEMO_SUPPLIERS.len());
    for (name, city, contact) in DEMO_SUPPLIERS {
        let res = supplier::Entity::insert(supplier::ActiveModel {
            name: Set((*name).to_owned()),
            contact_person: Set(Some((*contact).to_owned())),
            country: Set(supplier::DEFAULT_COUNTRY.to_owned()),
            city: Set(Some((*city).to_owned())),
            ce_certification: Set(true),
            rohs_certification: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        })
        .exec(&txn)
        .await?;
        supplier_ids.push(res.last_insert_id);
    }

    for (demo, supplier_id) in DEMO_PRODUCTS.iter().zip(supplier_ids.iter().copied()) {
        let res = product::Entity::insert(product::ActiveModel {
            sku: Set(demo.sku.to_owned()),
            name: Set(demo.name.to_owned()),
            category: Set(Some(demo.category.to_owned())),
            supplier_id: Set(Some(supplier_id)),
            purchase_price: Set(Some(demo.price)),
            stock_quantity: Set(demo.restock),
            stock_alert_threshold: Set(demo.threshold),
            last_purchase_date: Set(Some(now.clone())),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        })
        .exec(&txn)
        .await?;

        stock_entry::Entity::insert(stock_entry::ActiveModel {
            product_id: Set(res.last_insert_id),
            supplier_id: Set(supplier_id),
            quantity: Set(demo.restock),
            unit_price: Set(demo.price),
            entry_date: Set(now.clone()),
            invoice_number: Set(Some(format!("DEMO-{}", demo.sku))),
            ..Default::default()
        })
        .exec(&txn)
        .await?;
    }

    txn.commit().await?;
    tracing::info!(
        "🌱 Seeded {} suppliers and {} products",
        DEMO_SUPPLIERS.len(),
        DEMO_PRODUCTS.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::auth::verify_password;
    use crate::infrastructure::db::init_db;

    #[tokio::test]
    async fn bootstrap_admin_only_on_empty_table() {
        let db = init_db("sqlite::memory:").await.unwrap();

        let generated = ensure_admin(&db, None).await.unwrap().unwrap();
        let admin = user::Entity::find().one(&db).await.unwrap().unwrap();
        assert_eq!(admin.role, "Admin");
        assert!(verify_password(&generated, &admin.password_hash).unwrap());

        assert_eq!(ensure_admin(&db, Some("other")).await.unwrap(), None);
        assert_eq!(user::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn demo_seed_is_consistent_and_runs_once() {
        let db = init_db("sqlite::memory:").await.unwrap();
        seed_demo_data(&db).await.unwrap();
        seed_demo_data(&db).await.unwrap();

        assert_eq!(supplier::Entity::find().count(&db).await.unwrap(), 3);
        let products = product::Entity::find().all(&db).await.unwrap();
        assert_eq!(products.len(), 3);
        assert_eq!(products.iter().filter(|p| p.is_low_stock()).count(), 2);
        assert_eq!(stock_entry::Entity::find().count(&db).await.unwrap(), 3);
    }
}
