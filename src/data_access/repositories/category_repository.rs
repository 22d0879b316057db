use std::collections::HashSet;

use crate::data_access::data_context::{DataContext, StoreError, CATEGORIES_TABLE};
use crate::shared::models::category::Category;

#[derive(Clone)]
pub struct CategoryRepository {
    context: DataContext,
}

impl CategoryRepository {
    pub fn new(context: DataContext) -> Self {
        Self { context }
    }

    /// All categories ordered by name.
    pub fn find_all(&self) -> Result<Vec<Category>, StoreError> {
        let mut categories: Vec<Category> = self.context.query(CATEGORIES_TABLE, |_| true)?;
        sort_by_name(&mut categories);
        Ok(categories)
    }

    pub fn find_by_id(&self, id: u64) -> Result<Option<Category>, StoreError> {
        self.context.optional(CATEGORIES_TABLE, id)
    }

    /// Categories whose id is in `ids`, ordered by name. Unknown ids are skipped.
    pub fn find_by_ids(&self, ids: &[u64]) -> Result<Vec<Category>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let wanted: HashSet<u64> = ids.iter().copied().collect();
        let mut categories: Vec<Category> =
            self.context.query(CATEGORIES_TABLE, |c: &Category| wanted.contains(&c.id))?;
        sort_by_name(&mut categories);
        Ok(categories)
    }

    pub fn exists_by_id(&self, id: u64) -> Result<bool, StoreError> {
        Ok(self.find_by_id(id)?.is_some())
    }

    pub fn save(&self, name: &str) -> Result<Category, StoreError> {
        self.context.insert(CATEGORIES_TABLE, |id| Category {
            id,
            name: name.to_string(),
        })
    }

    /// Seed categories if none exist. Returns how many were created.
    pub fn ensure_defaults(&self, names: &[String]) -> Result<usize, StoreError> {
        if self.context.count(CATEGORIES_TABLE)? > 0 {
            return Ok(0);
        }
        for name in names {
            self.save(name)?;
        }
        Ok(names.len())
    }
}

pub(crate) fn sort_by_name(categories: &mut [Category]) {
    categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
}
