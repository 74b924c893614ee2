use serde::{Deserialize, Serialize};
use validator::Validate;

/// Contact information shared by suppliers and clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ContactInfo {
    #[validate(custom(function = "pharmastock_core::validation::phone"))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 300))]
    pub address: Option<String>,
}

impl ContactInfo {
    /// Drop empty strings so optional fields stay `None` instead of `Some("")`.
    pub(crate) fn tidy(mut self) -> Self {
        self.phone = non_empty(self.phone);
        self.email = non_empty(self.email);
        self.address = non_empty(self.address);
        self
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
