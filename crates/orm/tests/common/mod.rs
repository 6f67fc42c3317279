#![allow(dead_code)]

use grace_orm::prelude::*;
use serde::{Deserialize, Serialize};

pub const SCHEMA: &str = "
CREATE TABLE users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    age INTEGER NOT NULL,
    active BOOLEAN NOT NULL DEFAULT 1
);
CREATE TABLE products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    price REAL NOT NULL,
    stock INTEGER NOT NULL DEFAULT 0
);
";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub age: i64,
    pub active: bool,
}

impl User {
    pub const ID: Column<User, i64> = Column::new("id");
    pub const NAME: Column<User, String> = Column::new("name");
    pub const EMAIL: Column<User, String> = Column::new("email");
    pub const AGE: Column<User, i64> = Column::new("age");
    pub const ACTIVE: Column<User, bool> = Column::new("active");

    pub fn new(name: &str, age: i64, active: bool) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            age,
            active,
        }
    }
}

impl Model for User {
    fn table_name() -> &'static str {
        "users"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "name", "email", "age", "active"]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Option<i64>,
    pub name: String,
    pub price: f64,
    pub stock: i64,
}

impl Product {
    pub const PRICE: Column<Product, f64> = Column::new("price");
    pub const STOCK: Column<Product, i64> = Column::new("stock");

    pub fn new(name: &str, price: f64, stock: i64) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            price,
            stock,
        }
    }
}

impl Model for Product {
    fn table_name() -> &'static str {
        "products"
    }

    fn columns() -> &'static [&'static str] {
        &["id", "name", "price", "stock"]
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory database with both tables created and both models registered
pub async fn setup() -> Database {
    init_tracing();

    let engine = Engine::connect("sqlite::memory:").await.unwrap();
    engine.execute_script(SCHEMA).await.unwrap();

    let mut db = Database::new();
    db.set_default_engine(engine);
    db.register::<User>().unwrap();
    db.register::<Product>().unwrap();
    db
}

/// Alice 25, Bob 30, Charlie 35 (inactive), Diana 28, Eve 22 (inactive)
pub async fn seed_users(db: &Database) -> Vec<User> {
    let mut users = Vec::new();
    for (name, age, active) in [
        ("Alice", 25, true),
        ("Bob", 30, true),
        ("Charlie", 35, false),
        ("Diana", 28, true),
        ("Eve", 22, false),
    ] {
        users.push(User::create(db, User::new(name, age, active)).await.unwrap());
    }
    users
}
