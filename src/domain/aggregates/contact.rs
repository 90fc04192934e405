//! Contacts, their addresses and login accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_COUNTRY: &str = "India";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactType { Customer, Vendor, Both }

impl ContactType {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Customer => "customer", Self::Vendor => "vendor", Self::Both => "both" }
    }
    pub fn parse(s: &str) -> Option<Self> {
        match s { "customer" => Some(Self::Customer), "vendor" => Some(Self::Vendor), "both" => Some(Self::Both), _ => None }
    }
    pub fn is_vendor(&self) -> bool { matches!(self, Self::Vendor | Self::Both) }
    pub fn is_customer(&self) -> bool { matches!(self, Self::Customer | Self::Both) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub contact_name: String,
    pub contact_type: ContactType,
    pub email: String,
    pub mobile: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub country: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Postal fields shared by contacts and saved addresses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PostalFields {
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub country: Option<String>,
}

impl Contact {
    pub fn new(name: impl Into<String>, contact_type: ContactType, email: impl Into<String>, mobile: Option<String>, postal: PostalFields) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), contact_name: name.into(), contact_type, email: email.into().trim().to_lowercase(),
            mobile, address_line1: postal.address_line1, address_line2: postal.address_line2, city: postal.city,
            state: postal.state, pincode: postal.pincode,
            country: postal.country.unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            is_active: true, created_at: now, updated_at: now,
        }
    }
}

/// Partial contact edit; `None` leaves the field untouched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ContactChanges {
    pub contact_name: Option<String>,
    pub contact_type: Option<ContactType>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    #[serde(flatten)]
    pub postal: PostalFields,
    pub is_active: Option<bool>,
}

impl Contact {
    pub fn apply(&mut self, c: ContactChanges) {
        if let Some(v) = c.contact_name { self.contact_name = v; }
        if let Some(v) = c.contact_type { self.contact_type = v; }
        if let Some(v) = c.email { self.email = v.trim().to_lowercase(); }
        if let Some(v) = c.mobile { self.mobile = Some(v); }
        if let Some(v) = c.postal.address_line1 { self.address_line1 = Some(v); }
        if let Some(v) = c.postal.address_line2 { self.address_line2 = Some(v); }
        if let Some(v) = c.postal.city { self.city = Some(v); }
        if let Some(v) = c.postal.state { self.state = Some(v); }
        if let Some(v) = c.postal.pincode { self.pincode = Some(v); }
        if let Some(v) = c.postal.country { self.country = v; }
        if let Some(v) = c.is_active { self.is_active = v; }
        self.updated_at = Utc::now();
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: Uuid,
    pub contact_id: Uuid,
    pub label: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub country: String,
    pub is_default_shipping: bool,
    pub is_default_billing: bool,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// Makes `chosen` the only default of its kind among `addresses`.
    pub fn set_defaults(addresses: &mut [Address], chosen: Uuid) {
        let (shipping, billing) = addresses.iter().find(|a| a.id == chosen)
            .map(|a| (a.is_default_shipping, a.is_default_billing))
            .unwrap_or((false, false));
        for a in addresses.iter_mut().filter(|a| a.id != chosen) {
            if shipping { a.is_default_shipping = false; }
            if billing { a.is_default_billing = false; }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole { Internal, Portal }

impl UserRole {
    pub fn as_str(&self) -> &'static str { match self { Self::Internal => "internal", Self::Portal => "portal" } }
    pub fn parse(s: &str) -> Option<Self> {
        match s { "internal" => Some(Self::Internal), "portal" => Some(Self::Portal), _ => None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
    pub contact_id: Option<Uuid>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn portal(username: impl Into<String>, email: impl Into<String>, password_hash: String, contact_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(), username: username.into().trim().to_string(), email: email.into().trim().to_lowercase(),
            password_hash, role: UserRole::Portal, contact_id: Some(contact_id), is_active: true,
            last_login: None, created_at: Utc::now(),
        }
    }

    /// Back-office access: staff, or a portal user whose contact supplies goods.
    pub fn can_use_vendor_dashboard(&self, contact: Option<&Contact>) -> bool {
        self.role == UserRole::Internal || contact.is_some_and(|c| c.contact_type.is_vendor())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("Username already taken")]
    UsernameTaken,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("User has no contact profile")]
    NoContact,
    #[error("Vendor access required")]
    NotVendor,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(contact_id: Uuid, shipping: bool, billing: bool) -> Address {
        Address {
            id: Uuid::now_v7(), contact_id, label: "Home".into(), address_line1: "12 MG Road".into(), address_line2: None,
            city: "Pune".into(), state: None, pincode: None, country: DEFAULT_COUNTRY.into(),
            is_default_shipping: shipping, is_default_billing: billing, created_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_default_clears_others() {
        let contact = Uuid::now_v7();
        let mut addresses = vec![address(contact, true, true), address(contact, true, false)];
        let chosen = addresses[1].id;
        Address::set_defaults(&mut addresses, chosen);
        assert!(!addresses[0].is_default_shipping);
        assert!(addresses[0].is_default_billing);
        assert!(addresses[1].is_default_shipping);
    }

    #[test]
    fn test_vendor_dashboard_access() {
        let vendor = Contact::new("Loom Works", ContactType::Both, "Sales@Loom.in ", None, PostalFields::default());
        assert_eq!(vendor.email, "sales@loom.in");
        assert_eq!(vendor.country, "India");
        let mut user = User::portal("loom", "sales@loom.in", String::new(), vendor.id);
        assert!(user.can_use_vendor_dashboard(Some(&vendor)));
        let customer = Contact::new("Asha", ContactType::Customer, "asha@example.com", None, PostalFields::default());
        assert!(!user.can_use_vendor_dashboard(Some(&customer)));
        user.role = UserRole::Internal;
        assert!(user.can_use_vendor_dashboard(None));
    }
}
