//! Shipping details captured at checkout.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Settlement method. Only cash on delivery is offered; no online capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "COD")]
    CashOnDelivery,
}

/// Delivery target and contact details for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl ShippingDetails {
    /// Checks that every required field is present and well-formed.
    ///
    /// Runs before any store call so a bad form never reaches the batch.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("zip", &self.zip),
            ("phone", &self.phone),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField { field });
            }
        }

        if !self.email.contains('@') {
            return Err(ValidationError::InvalidField {
                field: "email",
                reason: "must be an email address".to_string(),
            });
        }

        let phone = self.phone.trim();
        if phone.len() != 10 || !phone.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidField {
                field: "phone",
                reason: "must be a 10 digit mobile number".to_string(),
            });
        }

        Ok(())
    }

    /// Contact email in the normalised form stored on the order.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }

    /// Recipient's full name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

#[cfg(test)]
pub(crate) fn sample_shipping() -> ShippingDetails {
    ShippingDetails {
        first_name: "Rahul".to_string(),
        last_name: "Sharma".to_string(),
        email: "Rahul@Example.com".to_string(),
        address: "12 Marine Drive".to_string(),
        city: "Mumbai".to_string(),
        state: "MH".to_string(),
        zip: "400001".to_string(),
        phone: "9876543210".to_string(),
        payment_method: PaymentMethod::CashOnDelivery,
    }
}
