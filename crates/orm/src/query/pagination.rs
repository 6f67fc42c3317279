//! Query Builder pagination operations

use super::builder::Query;
use crate::schema::Model;

impl<M: Model> Query<M> {
    /// Set the LIMIT clause, replacing any previous limit
    pub fn limit(mut self, count: i64) -> Self {
        self.limit_count = Some(count);
        self
    }

    /// Set the OFFSET clause, replacing any previous offset
    pub fn offset(mut self, count: i64) -> Self {
        self.offset_value = Some(count);
        self
    }

    /// Add pagination (LIMIT + OFFSET), pages numbered from 1
    pub fn paginate(mut self, per_page: i64, page: i64) -> Self {
        let page = page.max(1);
        self.limit_count = Some(per_page);
        self.offset_value = Some((page - 1).saturating_mul(per_page));
        self
    }
}
