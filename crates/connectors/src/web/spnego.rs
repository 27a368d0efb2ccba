use crate::error::{ConnectorError, FetchError};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE},
    Response, StatusCode,
};
use std::sync::Arc;
use tracing::debug;

/// The server is allowed this many Negotiate continuations before the
/// request fails.
pub const MAX_NEGOTIATE_ROUNDS: usize = 3;

/// Produces the client-side tokens of a SPNEGO handshake. The production
/// implementation wraps a GSSAPI security context; tests script the
/// exchange.
pub trait NegotiateTokenSource: Send {
    /// Produce the next client token given the server's previous response
    /// token (absent on the first round).
    fn step(&mut self, server_token: Option<&[u8]>) -> Result<Vec<u8>, ConnectorError>;
}

/// Creates a token source per request for the given service principal
/// (`HTTP@host`). Contexts are single-use, so each negotiation gets a
/// fresh one.
pub type TokenSourceFactory =
    Arc<dyn Fn(&str) -> Result<Box<dyn NegotiateTokenSource>, ConnectorError> + Send + Sync>;

/// GET-only JSON client that answers `WWW-Authenticate: Negotiate`
/// challenges.
pub struct NegotiateClient {
    client: reqwest::Client,
    factory: Option<TokenSourceFactory>,
    service: Option<String>,
}

impl NegotiateClient {
    pub fn new(factory: Option<TokenSourceFactory>, service: Option<String>) -> Self {
        NegotiateClient {
            client: reqwest::Client::new(),
            factory,
            service,
        }
    }

    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value, ConnectorError> {
        let mut response = self.client.get(url).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED && wants_negotiate(&response) {
            response = self.negotiate(url, &response).await?;
        }

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()).into());
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !content_type.starts_with("application/json") {
            return Err(ConnectorError::Prepare(format!(
                "expected application/json response, got '{content_type}'"
            )));
        }

        Ok(response.json().await?)
    }

    async fn negotiate(
        &self,
        url: &str,
        challenge: &Response,
    ) -> Result<Response, ConnectorError> {
        let factory = self.factory.as_ref().ok_or_else(|| {
            ConnectorError::Kerberos(
                "server demands Negotiate but no Kerberos credentials are configured".into(),
            )
        })?;
        let service = self.service.as_deref().ok_or_else(|| {
            ConnectorError::Kerberos("web-API source has no service principal configured".into())
        })?;

        let mut source = factory(service)?;
        let mut server_token = challenge_token(challenge)?;
        let mut rounds = 0;

        loop {
            if rounds == MAX_NEGOTIATE_ROUNDS {
                return Err(FetchError::NegotiateExhausted(rounds).into());
            }
            let token = source.step(server_token.as_deref())?;
            debug!(round = rounds, "sending Negotiate token");
            let response = self
                .client
                .get(url)
                .header(AUTHORIZATION, format!("Negotiate {}", BASE64.encode(&token)))
                .send()
                .await?;
            rounds += 1;

            if response.status() == StatusCode::UNAUTHORIZED && wants_negotiate(&response) {
                server_token = challenge_token(&response)?;
            } else {
                return Ok(response);
            }
        }
    }
}

fn wants_negotiate(response: &Response) -> bool {
    response
        .headers()
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .any(|v| {
            v.to_str()
                .map(|s| s.trim_start().starts_with("Negotiate"))
                .unwrap_or(false)
        })
}

/// Extract the server's continuation token from a challenge; a bare
/// `Negotiate` header carries none.
fn challenge_token(response: &Response) -> Result<Option<Vec<u8>>, ConnectorError> {
    for value in response.headers().get_all(WWW_AUTHENTICATE) {
        let Ok(text) = value.to_str() else { continue };
        let Some(rest) = text.trim_start().strip_prefix("Negotiate") else {
            continue;
        };
        let encoded = rest.trim();
        if encoded.is_empty() {
            return Ok(None);
        }
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| ConnectorError::Kerberos(format!("invalid Negotiate challenge: {e}")))?;
        return Ok(Some(bytes));
    }
    Ok(None)
}

#[cfg(feature = "kerberos")]
pub mod gss {
    use super::{NegotiateTokenSource, TokenSourceFactory};
    use crate::error::ConnectorError;
    use libgssapi::{
        context::{ClientCtx, CtxFlags, SecurityContext},
        credential::{Cred, CredUsage},
        name::Name,
        oid::{OidSet, GSS_MECH_SPNEGO, GSS_NT_HOSTBASED_SERVICE},
    };
    use std::sync::Arc;

    /// GSSAPI-backed token source for a single negotiation.
    pub struct GssTokenSource {
        ctx: ClientCtx,
    }

    impl GssTokenSource {
        pub fn new(service: &str) -> Result<Self, ConnectorError> {
            let name = Name::new(service.as_bytes(), Some(&GSS_NT_HOSTBASED_SERVICE))
                .map_err(|e| ConnectorError::Kerberos(e.to_string()))?;
            let mut mechs = OidSet::new().map_err(|e| ConnectorError::Kerberos(e.to_string()))?;
            mechs
                .add(&GSS_MECH_SPNEGO)
                .map_err(|e| ConnectorError::Kerberos(e.to_string()))?;
            let cred = Cred::acquire(None, None, CredUsage::Initiate, Some(&mechs))
                .map_err(|e| ConnectorError::Kerberos(e.to_string()))?;
            let ctx = ClientCtx::new(
                Some(cred),
                name,
                CtxFlags::GSS_C_MUTUAL_FLAG,
                Some(&GSS_MECH_SPNEGO),
            );
            Ok(GssTokenSource { ctx })
        }
    }

    impl NegotiateTokenSource for GssTokenSource {
        fn step(&mut self, server_token: Option<&[u8]>) -> Result<Vec<u8>, ConnectorError> {
            let out = self
                .ctx
                .step(server_token, None)
                .map_err(|e| ConnectorError::Kerberos(e.to_string()))?;
            match out {
                Some(buf) => Ok(buf.to_vec()),
                None => Err(ConnectorError::Kerberos(
                    "security context produced no continuation token".into(),
                )),
            }
        }
    }

    pub fn factory() -> TokenSourceFactory {
        Arc::new(|service: &str| {
            let source = GssTokenSource::new(service)?;
            Ok(Box::new(source) as Box<dyn NegotiateTokenSource>)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed list of client tokens.
    pub struct ScriptedTokenSource {
        tokens: Vec<Vec<u8>>,
        cursor: usize,
        pub seen_server_tokens: Vec<Option<Vec<u8>>>,
    }

    impl ScriptedTokenSource {
        pub fn new(tokens: Vec<Vec<u8>>) -> Self {
            ScriptedTokenSource {
                tokens,
                cursor: 0,
                seen_server_tokens: Vec::new(),
            }
        }
    }

    impl NegotiateTokenSource for ScriptedTokenSource {
        fn step(&mut self, server_token: Option<&[u8]>) -> Result<Vec<u8>, ConnectorError> {
            self.seen_server_tokens
                .push(server_token.map(|t| t.to_vec()));
            let token = self
                .tokens
                .get(self.cursor)
                .cloned()
                .ok_or_else(|| ConnectorError::Kerberos("scripted source exhausted".into()))?;
            self.cursor += 1;
            Ok(token)
        }
    }

    #[test]
    fn round_cap_matches_contract() {
        assert_eq!(MAX_NEGOTIATE_ROUNDS, 3);
    }

    #[test]
    fn scripted_source_replays_in_order() {
        let mut source = ScriptedTokenSource::new(vec![b"one".to_vec(), b"two".to_vec()]);
        assert_eq!(source.step(None).unwrap(), b"one".to_vec());
        assert_eq!(source.step(Some(b"chal")).unwrap(), b"two".to_vec());
        assert!(source.step(None).is_err());
        assert_eq!(
            source.seen_server_tokens,
            vec![None, Some(b"chal".to_vec()), None]
        );
    }
}
