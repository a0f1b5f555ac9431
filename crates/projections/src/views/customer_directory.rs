//! Customer directory for the admin panel.

use std::sync::Arc;

use async_trait::async_trait;
use domain::{UserId, UserProfile};
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Read model over every user profile, newest sign-up first.
#[derive(Clone)]
pub struct CustomerDirectory {
    profiles: Arc<RwLock<Vec<UserProfile>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl CustomerDirectory {
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(RwLock::new(Vec::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    pub async fn customers(&self) -> Vec<UserProfile> {
        self.profiles.read().await.clone()
    }

    pub async fn get_customer(&self, uid: &UserId) -> Option<UserProfile> {
        self.profiles
            .read()
            .await
            .iter()
            .find(|p| &p.uid == uid)
            .cloned()
    }

    /// Case-insensitive match on name or email.
    pub async fn search(&self, query: &str) -> Vec<UserProfile> {
        let query = query.trim().to_lowercase();
        self.profiles
            .read()
            .await
            .iter()
            .filter(|p| {
                query.is_empty()
                    || p.name.to_lowercase().contains(&query)
                    || p.email.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    pub async fn banned_count(&self) -> usize {
        self.profiles
            .read()
            .await
            .iter()
            .filter(|p| p.is_banned())
            .count()
    }

    /// Number of profiles, waiting for any in-progress refresh.
    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for CustomerDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection<UserProfile> for CustomerDirectory {
    fn name(&self) -> &'static str {
        "CustomerDirectory"
    }

    async fn replace(&self, snapshot: &[UserProfile]) -> Result<()> {
        let mut sorted = snapshot.to_vec();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        *self.profiles.write().await = sorted;
        let mut pos = self.position.write().await;
        *pos = pos.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.profiles.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for CustomerDirectory {
    fn name(&self) -> &'static str {
        "CustomerDirectory"
    }

    fn count(&self) -> usize {
        self.profiles.try_read().map(|p| p.len()).unwrap_or(0)
    }
}
