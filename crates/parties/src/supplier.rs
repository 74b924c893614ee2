use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use pharmastock_core::text::normalize_name;
use pharmastock_core::validation::not_blank;
use pharmastock_core::{DirectoryEntry, Entity, SupplierId, UniqueKey};

use crate::contact::{ContactInfo, non_empty};

/// Medication supplier (distributor or laboratory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Supplier {
    pub id: SupplierId,
    #[validate(length(max = 200), custom(function = "not_blank"))]
    pub name: String,
    pub contact_person: Option<String>,
    #[validate(nested)]
    #[serde(flatten)]
    pub contact: ContactInfo,
    pub created_at: DateTime<Utc>,
}

/// Registration payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    pub contact_person: Option<String>,
    #[serde(flatten)]
    pub contact: ContactInfo,
}

/// Partial update. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierPatch {
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl Supplier {
    pub fn register(data: NewSupplier, now: DateTime<Utc>) -> Self {
        Self {
            id: SupplierId::new(),
            name: data.name.trim().to_string(),
            contact_person: non_empty(data.contact_person),
            contact: data.contact.tidy(),
            created_at: now,
        }
    }

    pub fn apply(&mut self, patch: SupplierPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if patch.contact_person.is_some() {
            self.contact_person = non_empty(patch.contact_person);
        }
        if patch.phone.is_some() {
            self.contact.phone = non_empty(patch.phone);
        }
        if patch.email.is_some() {
            self.contact.email = non_empty(patch.email);
        }
        if patch.address.is_some() {
            self.contact.address = non_empty(patch.address);
        }
    }
}

impl Entity for Supplier {
    type Id = SupplierId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl DirectoryEntry for Supplier {
    const KIND: &'static str = "supplier";

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("name", normalize_name(&self.name))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmastock_core::{Directory, DomainError};

    fn supplier(name: &str) -> Supplier {
        Supplier::register(
            NewSupplier {
                name: name.to_string(),
                contact_person: Some("María Cevallos".to_string()),
                contact: ContactInfo {
                    phone: Some("+593 4 259 0000".to_string()),
                    email: Some("pedidos@difare.ec".to_string()),
                    address: None,
                },
            },
            Utc::now(),
        )
    }

    #[test]
    fn names_are_unique_after_normalization() {
        let mut dir = Directory::new();
        dir.add(supplier("Droguería Sánchez")).unwrap();

        let err = dir.add(supplier("drogueria   SANCHEZ")).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateEntity(_)));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn invalid_contact_is_rejected() {
        let mut dir = Directory::new();
        let mut bad = supplier("Difare");
        bad.contact.email = Some("pedidos".to_string());

        assert!(matches!(dir.add(bad).unwrap_err(), DomainError::ValidationFailed(_)));
        assert!(dir.is_empty());
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut dir = Directory::new();
        let id = dir.add(supplier("Difare")).unwrap().id;

        dir.update(&id, |s| {
            s.apply(SupplierPatch {
                phone: Some("0991234567".to_string()),
                address: Some("".to_string()),
                ..SupplierPatch::default()
            })
        })
        .unwrap();

        let s = dir.get(&id).unwrap();
        assert_eq!(s.name, "Difare");
        assert_eq!(s.contact.phone.as_deref(), Some("0991234567"));
        assert_eq!(s.contact.address, None);
        assert_eq!(s.contact.email.as_deref(), Some("pedidos@difare.ec"));
    }

    #[test]
    fn serializes_contact_inline() {
        let json = serde_json::to_value(supplier("Difare")).unwrap();
        assert_eq!(json["email"], "pedidos@difare.ec");
        assert!(json.get("contact").is_none());
    }
}
