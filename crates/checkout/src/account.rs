//! Customer accounts: profile provisioning, address book, wishlist and
//! order history.

use std::collections::HashSet;
use std::sync::Arc;

use domain::{
    Address, AddressKind, Order, ProductId, ProfileUpdate, Role, UserId, UserProfile,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use store::{DocumentStore, DocumentStoreExt, StoreError};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::identity::Identity;

/// An address entered in the address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub kind: AddressKind,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressForm {
    fn into_address(self) -> std::result::Result<Address, ValidationError> {
        for (field, value) in [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zip", &self.zip),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField { field });
            }
        }

        Ok(Address {
            id: Uuid::new_v4().to_string(),
            kind: self.kind,
            street: self.street.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            zip: self.zip.trim().to_string(),
            phone: self
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            is_default: self.is_default,
        })
    }
}

/// Account operations for signed-in customers.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn DocumentStore>,
    admin_emails: Arc<HashSet<String>>,
}

impl AccountService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            admin_emails: Arc::new(HashSet::new()),
        }
    }

    /// Emails that are provisioned with the admin role.
    pub fn with_admin_emails<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.admin_emails = Arc::new(
            emails
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        );
        self
    }

    fn role_for(&self, email: &str) -> Role {
        if self.admin_emails.contains(&email.trim().to_lowercase()) {
            Role::Admin
        } else {
            Role::Customer
        }
    }

    /// Returns the profile for `identity`, creating it on first sign-in.
    ///
    /// A verified identity marks a stored unverified profile as verified.
    #[tracing::instrument(skip(self, identity), fields(user_id = %identity.uid))]
    pub async fn ensure_profile(&self, identity: &Identity) -> Result<UserProfile> {
        if let Some(profile) = self.store.get_profile(&identity.uid).await? {
            if identity.email_verified && !profile.email_verified {
                let update = ProfileUpdate {
                    email_verified: Some(true),
                    ..Default::default()
                };
                return Ok(self.store.update_profile(&identity.uid, update).await?);
            }
            return Ok(profile);
        }

        let role = self.role_for(&identity.email);
        let profile = UserProfile::new(
            identity.uid.clone(),
            identity.display_name(),
            &identity.email,
            identity.email_verified,
            role,
        );

        match self.store.create_profile(profile.clone()).await {
            Ok(()) => {
                tracing::info!(role = ?role, "Profile created");
                Ok(profile)
            }
            // Lost a race with a concurrent first request.
            Err(StoreError::AlreadyExists { .. }) => {
                Ok(self.store.require_profile(&identity.uid).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn profile(&self, uid: &UserId) -> Result<UserProfile> {
        Ok(self.store.require_profile(uid).await?)
    }

    /// Updates the display name and phone. Verification is not client-settable.
    pub async fn update_profile(&self, uid: &UserId, update: ProfileUpdate) -> Result<UserProfile> {
        let update = ProfileUpdate {
            email_verified: None,
            ..update
        };
        Ok(self.store.update_profile(uid, update).await?)
    }

    /// Orders placed by `uid`, newest first.
    pub async fn orders(&self, uid: &UserId) -> Result<Vec<Order>> {
        Ok(self.store.orders_for_user(uid).await?)
    }

    /// Adds an address. The first address becomes the default.
    pub async fn add_address(&self, uid: &UserId, form: AddressForm) -> Result<UserProfile> {
        let mut address = form.into_address()?;
        let profile = self.store.require_profile(uid).await?;
        if profile.addresses.is_empty() {
            address.is_default = true;
        }
        Ok(self.store.add_address(uid, address).await?)
    }

    pub async fn remove_address(&self, uid: &UserId, address_id: &str) -> Result<UserProfile> {
        Ok(self.store.remove_address(uid, address_id).await?)
    }

    /// Toggles a product on the wishlist. Returns true if it was added.
    pub async fn toggle_wishlist(&self, uid: &UserId, product_id: &ProductId) -> Result<bool> {
        if self.store.get_product(product_id).await?.is_none() {
            return Err(ServiceError::NotFound {
                collection: "products",
                id: product_id.to_string(),
            });
        }
        Ok(self.store.toggle_wishlist(uid, product_id).await?)
    }
}
