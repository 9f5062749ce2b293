use chrono::{DateTime, Utc};

/// Signer status. Monotonic, same discipline as the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerStatus {
    Pending,
    Signed,
}

impl SignerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignerStatus::Pending => "pending",
            SignerStatus::Signed => "signed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(SignerStatus::Pending),
            "signed" => Some(SignerStatus::Signed),
            _ => None,
        }
    }
}

/// One required signatory on an envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeSigner {
    pub signer_id: String,
    pub document_id: String,
    pub name: String,
    pub email: String,
    /// CPF-style national identifier; masked before appearing in reports.
    pub national_id: Option<String>,
    /// External per-signer token; primary correlation key when present.
    pub provider_nonce: Option<String>,
    pub sign_url: Option<String>,
    pub status: SignerStatus,
    /// Set exactly once on the pending -> signed transition.
    pub signed_at: Option<DateTime<Utc>>,
    pub signing_ip: Option<String>,
    pub geolocation: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl EnvelopeSigner {
    /// Correlation used when applying provider state: provider nonce when
    /// both sides carry one, case-insensitive email match otherwise.
    pub fn matches_provider_identity(&self, nonce: Option<&str>, email: Option<&str>) -> bool {
        if let (Some(local), Some(remote)) = (self.provider_nonce.as_deref(), nonce) {
            return local == remote;
        }
        match email {
            Some(remote) => self.email.eq_ignore_ascii_case(remote),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(nonce: Option<&str>, email: &str) -> EnvelopeSigner {
        EnvelopeSigner {
            signer_id: "s-1".to_string(),
            document_id: "doc-1".to_string(),
            name: "Ana Souza".to_string(),
            email: email.to_string(),
            national_id: None,
            provider_nonce: nonce.map(str::to_string),
            sign_url: None,
            status: SignerStatus::Pending,
            signed_at: None,
            signing_ip: None,
            geolocation: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn nonce_match_takes_priority_over_email() {
        let local = signer(Some("nonce-a"), "ana@example.com");
        assert!(local.matches_provider_identity(Some("nonce-a"), Some("other@example.com")));
        assert!(!local.matches_provider_identity(Some("nonce-b"), Some("ana@example.com")));
    }

    #[test]
    fn email_match_is_case_insensitive() {
        let local = signer(None, "Ana.Souza@Example.com");
        assert!(local.matches_provider_identity(None, Some("ana.souza@example.com")));
        assert!(!local.matches_provider_identity(None, Some("bruno@example.com")));
    }

    #[test]
    fn falls_back_to_email_when_provider_has_no_nonce() {
        let local = signer(Some("nonce-a"), "ana@example.com");
        assert!(local.matches_provider_identity(None, Some("ana@example.com")));
    }
}
