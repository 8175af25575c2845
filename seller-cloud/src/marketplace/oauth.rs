use async_trait::async_trait;
use reqwest::Url;
use shared::market::TokenGrant;

use super::{MarketplaceClient, OAuthGateway, UpstreamError, decode};

type UrlParseError = <Url as std::str::FromStr>::Err;

/// Authorization page URL the seller is sent to, carrying `state`
pub fn authorization_url(
    auth_url: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> Result<Url, UrlParseError> {
    Url::parse_with_params(
        auth_url,
        &[
            ("response_type", "code"),
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("state", state),
        ],
    )
}

impl MarketplaceClient {
    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenGrant, UpstreamError> {
        let resp = self
            .http
            .post(self.url("oauth/token"))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;
        decode(resp).await
    }
}

#[async_trait]
impl OAuthGateway for MarketplaceClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, UpstreamError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, UpstreamError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_url_encodes_params() {
        let url = authorization_url(
            "https://auth.mercadolivre.com.br/authorization",
            "123",
            "https://seller.example.com/api/ml/callback",
            "abc-def",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://auth.mercadolivre.com.br/authorization?response_type=code&client_id=123\
             &redirect_uri=https%3A%2F%2Fseller.example.com%2Fapi%2Fml%2Fcallback&state=abc-def"
        );
    }

    #[test]
    fn authorization_url_rejects_garbage_base() {
        assert!(authorization_url("not a url", "1", "x", "s").is_err());
    }
}
