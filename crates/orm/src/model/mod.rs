//! Active Record - class-level finders and instance persistence for models
//!
//! - `finders`: lookups and shortcuts that start a [`Query`](crate::query::Query)
//! - `persistence`: create, save, update and delete
//! - `fields`: conversion between a model and its `(column, value)` pairs
//!
//! Both traits are implemented for every [`Model`], so importing
//! [`ActiveRecord`] (or the crate prelude) is all a model needs:
//!
//! ```ignore
//! let mut user = User::create(&db, User::new("Alice", 30)).await?;
//! user.update(&db, &[("age", json!(31))]).await?;
//! let found = User::find(&db, user.id).await?;
//! ```

mod fields;
pub mod finders;
pub mod persistence;

pub use finders::Finders;
pub use persistence::Persistence;

use crate::schema::Model;

/// Finders and persistence together
pub trait ActiveRecord: Model + Finders + Persistence {}

impl<T> ActiveRecord for T where T: Model + Finders + Persistence {}
