use moka::future::Cache;
use std::time::Duration;
use tracing::info;

use crate::db::{AttendanceStore, StoreError};
use crate::model::student::Student;

/// Read-through cache of registered students keyed by roll number.
///
/// Students are never updated or deleted, so an entry cannot go stale; only
/// hits are cached because a roll may be registered at any time.
#[derive(Clone)]
pub struct StudentCache {
    cache: Cache<String, Student>,
}

impl StudentCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(Duration::from_secs(86400)) // 24h TTL
                .build(),
        }
    }

    pub async fn remember(&self, student: &Student) {
        self.cache
            .insert(student.roll_number.clone(), student.clone())
            .await;
    }

    pub async fn get(&self, roll_number: &str) -> Option<Student> {
        self.cache.get(roll_number).await
    }

    pub async fn lookup(
        &self,
        store: &dyn AttendanceStore,
        roll_number: &str,
    ) -> Result<Option<Student>, StoreError> {
        if let Some(student) = self.get(roll_number).await {
            return Ok(Some(student));
        }

        let found = store.find_student(roll_number).await?;
        if let Some(student) = &found {
            self.remember(student).await;
        }
        Ok(found)
    }

    async fn batch_remember(&self, students: &[Student]) {
        let futures: Vec<_> = students.iter().map(|s| self.remember(s)).collect();

        // Await all insertions concurrently
        futures::future::join_all(futures).await;
    }

    /// Load the registry into the cache in batches
    pub async fn warmup(&self, store: &dyn AttendanceStore, batch_size: usize) -> Result<usize, StoreError> {
        let students = store.list_students().await?;

        for batch in students.chunks(batch_size.max(1)) {
            self.batch_remember(batch).await;
        }

        info!(count = students.len(), "Student cache warmup complete");
        Ok(students.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[actix_web::test]
    async fn lookup_caches_hits_only() {
        let store = MemoryStore::new();
        let cache = StudentCache::new(100);

        assert_eq!(cache.lookup(&store, "2023001").await.unwrap(), None);
        assert_eq!(cache.get("2023001").await, None);

        let student = Student::new("2023001", "Rahul Sharma", "CS-A", None);
        store.insert_student(&student).await.unwrap();
        assert_eq!(cache.lookup(&store, "2023001").await.unwrap(), Some(student.clone()));
        assert_eq!(cache.get("2023001").await, Some(student));
    }

    #[actix_web::test]
    async fn warmup_loads_every_student() {
        let store = MemoryStore::new();
        store
            .insert_students(&crate::model::student::sample_students())
            .await
            .unwrap();

        let cache = StudentCache::new(100);
        assert_eq!(cache.warmup(&store, 3).await.unwrap(), 10);
        assert!(cache.get("2023010").await.is_some());
    }
}
