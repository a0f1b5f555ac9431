//! Customer profiles and address book.

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::shipping::ShippingDetails;

/// Access role stored on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

/// Account standing. Banned accounts keep their data but lose access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Banned,
}

impl UserStatus {
    /// Returns the opposite standing, used by the ban/unban toggle.
    pub fn toggled(&self) -> Self {
        match self {
            UserStatus::Active => UserStatus::Banned,
            UserStatus::Banned => UserStatus::Active,
        }
    }
}

/// Label on a saved address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AddressKind {
    #[default]
    Home,
    Work,
    Other,
}

/// A saved delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: String,
    #[serde(default)]
    pub kind: AddressKind,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    /// Builds a `Home` address from the details used at checkout.
    pub fn from_shipping(id: impl Into<String>, shipping: &ShippingDetails, is_default: bool) -> Self {
        let phone = shipping.phone.trim();
        Self {
            id: id.into(),
            kind: AddressKind::Home,
            street: shipping.address.trim().to_string(),
            city: shipping.city.trim().to_string(),
            state: shipping.state.trim().to_string(),
            zip: shipping.zip.trim().to_string(),
            phone: (!phone.is_empty()).then(|| phone.to_string()),
            is_default,
        }
    }

    /// Returns true if this is the same destination as `shipping`.
    pub fn matches(&self, shipping: &ShippingDetails) -> bool {
        fn same(a: &str, b: &str) -> bool {
            a.trim().eq_ignore_ascii_case(b.trim())
        }
        same(&self.street, &shipping.address)
            && same(&self.city, &shipping.city)
            && same(&self.state, &shipping.state)
            && same(&self.zip, &shipping.zip)
    }
}

/// Profile data kept alongside an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub wishlist: Vec<ProductId>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Creates a fresh active profile with an empty address book.
    pub fn new(uid: UserId, name: impl Into<String>, email: &str, email_verified: bool, role: Role) -> Self {
        Self {
            uid,
            name: name.into(),
            email: email.trim().to_lowercase(),
            email_verified,
            role,
            status: UserStatus::Active,
            phone: String::new(),
            addresses: Vec::new(),
            wishlist: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Returns true for administrators.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Returns true if the account has been banned.
    pub fn is_banned(&self) -> bool {
        self.status == UserStatus::Banned
    }

    /// Returns true if any saved address matches the shipping destination.
    pub fn has_address_for(&self, shipping: &ShippingDetails) -> bool {
        self.addresses.iter().any(|a| a.matches(shipping))
    }
}

/// Partial update of profile scalar fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
}

impl ProfileUpdate {
    /// Applies the present fields to `profile`.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(phone) = &self.phone {
            profile.phone = phone.clone();
        }
        if let Some(verified) = self.email_verified {
            profile.email_verified = verified;
        }
    }
}
