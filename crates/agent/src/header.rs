/// Wire identifier for the signature algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    EcdsaSha256,
    HmacSha256,
}

impl SignatureAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            SignatureAlgorithm::EcdsaSha256 => "ecdsa-sha256",
            SignatureAlgorithm::HmacSha256 => "hmac-sha256",
        }
    }
}

/// The `Authorization` header of a signed KBMAPI request.
///
/// The rendered form must match the verifier byte-for-byte: field order,
/// quoting, and the literal `headers="date"` are all load-bearing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeader {
    pub key_id: String,
    pub algorithm: SignatureAlgorithm,
    pub signature: String,
}

impl AuthorizationHeader {
    /// Panics on an empty `key_id` or `signature`: values that can only
    /// reach the formatter through a bug upstream.
    pub fn new(key_id: String, algorithm: SignatureAlgorithm, signature: String) -> Self {
        assert!(!key_id.is_empty(), "authorization header requires a keyId");
        assert!(
            !signature.is_empty(),
            "authorization header requires a signature"
        );
        Self {
            key_id,
            algorithm,
            signature,
        }
    }

    pub fn render(&self) -> String {
        format!(
            "Signature keyId=\"{}\",algorithm=\"{}\",headers=\"date\",signature=\"{}\"",
            self.key_id,
            self.algorithm.as_str(),
            self.signature
        )
    }

    /// Inverse of [`render`](Self::render), used to verify rendered
    /// headers. Accepts only this agent's template, not a general HTTP
    /// Signature parser.
    pub fn parse(header: &str) -> Option<Self> {
        let params = header.strip_prefix("Signature ")?;
        let mut key_id = None;
        let mut algorithm = None;
        let mut headers = None;
        let mut signature = None;
        for param in params.split(',') {
            let (name, value) = param.split_once('=')?;
            let value = value.strip_prefix('"')?.strip_suffix('"')?;
            match name {
                "keyId" => key_id = Some(value.to_string()),
                "algorithm" => {
                    algorithm = Some(match value {
                        "ecdsa-sha256" => SignatureAlgorithm::EcdsaSha256,
                        "hmac-sha256" => SignatureAlgorithm::HmacSha256,
                        _ => return None,
                    });
                }
                "headers" => headers = Some(value.to_string()),
                "signature" => signature = Some(value.to_string()),
                _ => return None,
            }
        }
        if headers.as_deref() != Some("date") {
            return None;
        }
        Some(Self {
            key_id: key_id?,
            algorithm: algorithm?,
            signature: signature?,
        })
    }
}
