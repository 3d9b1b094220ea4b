//! Claims and the trust they are issued by.

use crate::config::CLAIM_VALUE_TYPE_STRING;
use serde::{Deserialize, Serialize};

/// A claim as exchanged with SharePoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
    pub value_type: String,
    pub original_issuer: String,
}

impl Claim {
    pub fn new(
        claim_type: impl Into<String>,
        value: impl Into<String>,
        value_type: impl Into<String>,
        original_issuer: impl Into<String>,
    ) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
            value_type: value_type.into(),
            original_issuer: original_issuer.into(),
        }
    }

    /// String claim issued by `trust`.
    pub fn issued_by(
        trust: &TrustedLoginProvider,
        claim_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(claim_type, value, CLAIM_VALUE_TYPE_STRING, trust.original_issuer())
    }
}

/// The SharePoint trust (`SPTrustedLoginProvider`) a claims provider is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedLoginProvider {
    pub name: String,
    /// Claim type SharePoint uses for the signed-in identity.
    pub identity_claim_type: String,
    /// Claim types registered in the trust.
    pub claim_types: Vec<String>,
}

impl TrustedLoginProvider {
    pub fn new(
        name: impl Into<String>,
        identity_claim_type: impl Into<String>,
        claim_types: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let identity_claim_type = identity_claim_type.into();
        let mut claim_types: Vec<String> = claim_types.into_iter().map(Into::into).collect();
        if !claim_types
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&identity_claim_type))
        {
            claim_types.insert(0, identity_claim_type.clone());
        }
        Self {
            name: name.into(),
            identity_claim_type,
            claim_types,
        }
    }

    /// Issuer stamped on claims created for this trust.
    pub fn original_issuer(&self) -> String {
        format!("TrustedProvider:{}", self.name)
    }

    pub fn is_registered(&self, claim_type: &str) -> bool {
        self.claim_types
            .iter()
            .any(|c| c.eq_ignore_ascii_case(claim_type))
    }

    pub fn is_issuer_of(&self, claim: &Claim) -> bool {
        claim
            .original_issuer
            .eq_ignore_ascii_case(&self.original_issuer())
    }
}
