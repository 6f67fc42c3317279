mod common;

use common::{seed_users, setup, Product, User};
use grace_orm::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
struct Membership {
    guild_id: i64,
    user_id: i64,
    role: String,
}

impl Model for Membership {
    fn table_name() -> &'static str {
        "memberships"
    }

    fn columns() -> &'static [&'static str] {
        &["guild_id", "user_id", "role"]
    }

    fn primary_key_columns() -> &'static [&'static str] {
        &["guild_id", "user_id"]
    }
}

#[tokio::test]
async fn test_queries_fail_before_engine_is_set() {
    let db = Database::new();

    let err = User::all(&db).await.unwrap_err();
    assert!(matches!(err, ModelError::Configuration(_)));
    assert!(err.to_string().contains("No engine set for User"));

    assert!(User::query(&db).is_err());
    assert!(User::create(&db, User::new("Alice", 25, true)).await.is_err());
}

#[tokio::test]
async fn test_create_then_find_returns_equal_record() {
    let db = setup().await;

    let created = User::create(&db, User::new("Alice", 25, true)).await.unwrap();
    let id = created.id.expect("create assigns an id");

    let found = User::find(&db, id).await.unwrap();
    assert_eq!(found, Some(created));
}

#[tokio::test]
async fn test_find_missing_is_none() {
    let db = setup().await;
    assert_eq!(User::find(&db, 404).await.unwrap(), None);
}

#[tokio::test]
async fn test_find_with_composite_key_is_rejected() {
    let db = Database::new();
    let err = Membership::find(&db, 1).await.unwrap_err();
    assert!(matches!(err, ModelError::InvalidKey(_)));
}

#[tokio::test]
async fn test_find_by() {
    let db = setup().await;
    seed_users(&db).await;

    let bob = User::find_by(&db, &[("name", json!("Bob"))]).await.unwrap();
    assert_eq!(bob.map(|user| user.age), Some(30));

    let nobody = User::find_by(&db, &[("name", json!("Bob")), ("age", json!(31))])
        .await
        .unwrap();
    assert!(nobody.is_none());

    let err = User::find_by(&db, &[]).await.unwrap_err();
    assert!(matches!(err, ModelError::Precondition(_)));
    assert!(err.to_string().contains("At least one keyword argument"));

    let err = User::find_by(&db, &[("nickname", json!("bobby"))])
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::UnknownField { .. }));
    assert_eq!(err.to_string(), "User has no column 'nickname'");
}

#[tokio::test]
async fn test_five_user_scenario() {
    let db = setup().await;
    seed_users(&db).await;

    assert_eq!(User::count(&db).await.unwrap(), 5);

    let active = User::where_eq(&db, "active", true).unwrap();
    assert_eq!(active.count().await.unwrap(), 3);

    let oldest = User::order_by(&db, User::AGE.desc())
        .unwrap()
        .first()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(oldest.age, 35);

    let mut ages: Vec<i64> = User::filter(&db, User::AGE.gt(25).and(User::ACTIVE.eq(true)))
        .unwrap()
        .all()
        .await
        .unwrap()
        .into_iter()
        .map(|user| user.age)
        .collect();
    ages.sort_unstable();
    assert_eq!(ages, vec![28, 30]);
}

#[tokio::test]
async fn test_update_persists_and_ignores_unknown_keys() {
    let db = setup().await;
    let mut alice = User::create(&db, User::new("Alice", 25, true)).await.unwrap();

    alice
        .update(&db, &[("age", json!(26)), ("nickname", json!("Al"))])
        .await
        .unwrap();
    assert_eq!(alice.age, 26);

    let stored = User::find(&db, alice.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.age, 26);
    assert_eq!(stored.name, "Alice");
    assert_eq!(User::count(&db).await.unwrap(), 1);

    let mut fetched = User::find(&db, alice.id.unwrap()).await.unwrap().unwrap();
    fetched.update(&db, &[("name", json!("X"))]).await.unwrap();
    let refreshed = User::find(&db, alice.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(refreshed.name, "X");
}

#[tokio::test]
async fn test_update_with_wrong_type_fails() {
    let db = setup().await;
    let mut alice = User::create(&db, User::new("Alice", 25, true)).await.unwrap();

    let err = alice
        .update(&db, &[("age", json!("twenty-six"))])
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Serialization(_)));

    let stored = User::find(&db, alice.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.age, 25);
}

#[tokio::test]
async fn test_save_inserts_then_updates_in_place() {
    let db = setup().await;

    let mut bob = User::new("Bob", 30, true);
    bob.save(&db).await.unwrap();
    let id = bob.id.expect("save assigns an id");

    bob.email = "robert@example.com".to_string();
    bob.save(&db).await.unwrap();

    assert_eq!(bob.id, Some(id));
    assert_eq!(User::count(&db).await.unwrap(), 1);

    let stored = User::find(&db, id).await.unwrap().unwrap();
    assert_eq!(stored.email, "robert@example.com");
}

#[tokio::test]
async fn test_save_with_explicit_key_inserts() {
    let db = setup().await;

    let mut user = User::new("Frank", 40, false);
    user.id = Some(42);
    user.save(&db).await.unwrap();

    assert_eq!(User::find(&db, 42).await.unwrap(), Some(user));
}

#[tokio::test]
async fn test_delete_removes_row_but_keeps_value() {
    let db = setup().await;
    let users = seed_users(&db).await;
    let eve = users.last().unwrap().clone();

    eve.delete(&db).await.unwrap();

    assert_eq!(eve.name, "Eve");
    assert_eq!(User::find(&db, eve.id.unwrap()).await.unwrap(), None);
    assert_eq!(User::count(&db).await.unwrap(), 4);
}

#[tokio::test]
async fn test_delete_unsaved_record_fails() {
    let db = setup().await;
    let err = User::new("Ghost", 99, false).delete(&db).await.unwrap_err();
    assert!(matches!(err, ModelError::MissingPrimaryKey));
}

#[tokio::test]
async fn test_models_share_one_engine() {
    let db = setup().await;
    seed_users(&db).await;

    Product::create(&db, Product::new("Keyboard", 49.99, 10)).await.unwrap();
    Product::create(&db, Product::new("Mouse", 19.5, 0)).await.unwrap();

    assert!(db.get_engine::<User>().unwrap().same_as(&db.get_engine::<Product>().unwrap()));
    assert_eq!(User::count(&db).await.unwrap(), 5);
    assert_eq!(Product::count(&db).await.unwrap(), 2);

    let in_stock = Product::filter(&db, Product::STOCK.gt(0))
        .unwrap()
        .one()
        .await
        .unwrap();
    assert_eq!(in_stock.name, "Keyboard");

    let cheap = Product::filter(&db, Product::PRICE.lt(20.0))
        .unwrap()
        .all()
        .await
        .unwrap();
    assert_eq!(cheap.len(), 1);
}

#[tokio::test]
async fn test_model_specific_engine() {
    let db_default = setup().await;
    let mut db = db_default.clone();

    let products_engine = Engine::connect("sqlite::memory:").await.unwrap();
    products_engine.execute_script(common::SCHEMA).await.unwrap();
    db.set_engine::<Product>(products_engine.clone()).unwrap();

    Product::create(&db, Product::new("Monitor", 199.0, 3)).await.unwrap();

    assert_eq!(Product::count(&db).await.unwrap(), 1);
    assert_eq!(Product::count(&db_default).await.unwrap(), 0);
}
