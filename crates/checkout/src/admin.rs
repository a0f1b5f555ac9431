//! Back-office services: catalogue editing and customer standing.

use std::sync::Arc;

use domain::{Product, ProductId, UserId, UserProfile, UserStatus, ValidationError};
use store::{DocumentStore, DocumentStoreExt};

use crate::error::{Result, ServiceError};

/// Catalogue reads and admin edits.
#[derive(Clone)]
pub struct CatalogueService {
    store: Arc<dyn DocumentStore>,
}

impl CatalogueService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn products(&self) -> Result<Vec<Product>> {
        Ok(self.store.list_products().await?)
    }

    pub async fn product(&self, id: &ProductId) -> Result<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound {
                collection: "products",
                id: id.to_string(),
            })
    }

    /// Creates or replaces a product.
    #[tracing::instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn save_product(&self, product: Product) -> Result<Product> {
        if product.name.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "name" }.into());
        }
        if !product.price.is_positive() {
            return Err(ValidationError::InvalidField {
                field: "price",
                reason: "must be positive".to_string(),
            }
            .into());
        }
        if product.stock < 0 {
            return Err(ValidationError::InvalidField {
                field: "stock",
                reason: "must not be negative".to_string(),
            }
            .into());
        }

        self.store.upsert_product(product.clone()).await?;
        tracing::info!(stock = product.stock, "Product saved");
        Ok(product)
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_product(&self, id: &ProductId) -> Result<()> {
        self.store.remove_product(id).await?;
        tracing::info!("Product removed");
        Ok(())
    }

    /// Writes the built-in catalogue if the store has no products.
    pub async fn seed_if_empty(&self) -> Result<usize> {
        let seeded = self.store.seed_if_empty(domain::seed_catalogue()).await?;
        if seeded > 0 {
            tracing::info!(products = seeded, "Seeded catalogue");
        }
        Ok(seeded)
    }
}

/// Customer list and ban/unban for administrators.
#[derive(Clone)]
pub struct CustomerService {
    store: Arc<dyn DocumentStore>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Every profile, newest first.
    pub async fn customers(&self) -> Result<Vec<UserProfile>> {
        let mut profiles = self.store.list_profiles().await?;
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(profiles)
    }

    /// Bans or reinstates a customer. Administrators cannot be banned.
    #[tracing::instrument(skip(self), fields(user_id = %uid))]
    pub async fn set_status(&self, uid: &UserId, status: UserStatus) -> Result<UserProfile> {
        let profile = self.store.require_profile(uid).await?;
        if profile.is_admin() {
            return Err(ServiceError::AdminProtected(uid.clone()));
        }
        if profile.status == status {
            return Ok(profile);
        }

        let updated = self.store.set_user_status(uid, status).await?;
        tracing::info!(status = ?status, "Customer status changed");
        Ok(updated)
    }

    /// Flips a customer between active and banned.
    pub async fn toggle_status(&self, uid: &UserId) -> Result<UserProfile> {
        let current = self.store.require_profile(uid).await?.status;
        self.set_status(uid, current.toggled()).await
    }
}

#[cfg(test)]
mod tests {
    use domain::{Category, Money, Role, seed_catalogue};
    use store::InMemoryDocumentStore;

    use super::*;

    #[tokio::test]
    async fn test_save_product_validates_fields() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let catalogue = CatalogueService::new(store);

        let mut ring = Product::new("r1", "Solitaire", Money::from_rupees(90_000), Category::Rings, 3);
        assert!(catalogue.save_product(ring.clone()).await.is_ok());

        ring.stock = -1;
        assert!(matches!(
            catalogue.save_product(ring).await,
            Err(ServiceError::Validation(ValidationError::InvalidField { field: "stock", .. }))
        ));

        assert!(catalogue.product(&ProductId::new("r1")).await.is_ok());
        catalogue.remove_product(&ProductId::new("r1")).await.unwrap();
        assert!(matches!(
            catalogue.product(&ProductId::new("r1")).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_seed_runs_once() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let catalogue = CatalogueService::new(store);
        assert_eq!(catalogue.seed_if_empty().await.unwrap(), seed_catalogue().len());
        assert_eq!(catalogue.seed_if_empty().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_admins_cannot_be_banned() {
        let store = Arc::new(InMemoryDocumentStore::new());
        store
            .create_profile(UserProfile::new(UserId::new("a"), "Owner", "o@aurum.in", true, Role::Admin))
            .await
            .unwrap();
        store
            .create_profile(UserProfile::new(UserId::new("c"), "Ravi", "r@mail.in", true, Role::Customer))
            .await
            .unwrap();
        let customers = CustomerService::new(store);

        assert_eq!(
            customers.toggle_status(&UserId::new("a")).await,
            Err(ServiceError::AdminProtected(UserId::new("a")))
        );

        let banned = customers.toggle_status(&UserId::new("c")).await.unwrap();
        assert!(banned.is_banned());
        let active = customers.toggle_status(&UserId::new("c")).await.unwrap();
        assert_eq!(active.status, UserStatus::Active);
        assert_eq!(customers.customers().await.unwrap().len(), 2);
    }
}
