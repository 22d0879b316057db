use crate::data_access::data_context::{DataContext, StoreError, PRIORITIES_TABLE};
use crate::shared::models::{priority::Priority, settings::PrioritySeed};

#[derive(Clone)]
pub struct PriorityRepository {
    context: DataContext,
}

impl PriorityRepository {
    pub fn new(context: DataContext) -> Self {
        Self { context }
    }

    /// All priorities ordered by position.
    pub fn find_all(&self) -> Result<Vec<Priority>, StoreError> {
        let mut priorities: Vec<Priority> = self.context.query(PRIORITIES_TABLE, |_| true)?;
        priorities.sort_by_key(|p| (p.position, p.id));
        Ok(priorities)
    }

    pub fn find_by_id(&self, id: u64) -> Result<Option<Priority>, StoreError> {
        self.context.optional(PRIORITIES_TABLE, id)
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Priority>, StoreError> {
        let found: Vec<Priority> = self.context.query(PRIORITIES_TABLE, |p: &Priority| p.name == name)?;
        Ok(found.into_iter().next())
    }

    pub fn exists_by_id(&self, id: u64) -> Result<bool, StoreError> {
        Ok(self.find_by_id(id)?.is_some())
    }

    pub fn save(&self, name: &str, position: i32) -> Result<Priority, StoreError> {
        self.context.insert(PRIORITIES_TABLE, |id| Priority {
            id,
            name: name.to_string(),
            position,
        })
    }

    pub fn delete_by_id(&self, id: u64) -> Result<bool, StoreError> {
        self.context.delete(PRIORITIES_TABLE, id)
    }

    /// Seed priorities if none exist. Returns how many were created.
    pub fn ensure_defaults(&self, seeds: &[PrioritySeed]) -> Result<usize, StoreError> {
        if self.context.count(PRIORITIES_TABLE)? > 0 {
            return Ok(0);
        }
        for seed in seeds {
            self.save(&seed.name, seed.position)?;
        }
        Ok(seeds.len())
    }
}
