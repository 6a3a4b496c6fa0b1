use std::fmt;

use oauth2::{basic::BasicClient, AuthUrl, Client, ClientId, ClientSecret, RedirectUrl, TokenUrl};
use serde::Deserialize;
use serde_json::Value;

use crate::{AppResult, GetField};

pub(crate) type HappyClient = Client<oauth2::StandardErrorResponse<oauth2::basic::BasicErrorResponseType>, oauth2::StandardTokenResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>, oauth2::StandardTokenIntrospectionResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>, oauth2::StandardRevocableToken, oauth2::StandardErrorResponse<oauth2::RevocationErrorResponseType>, oauth2::EndpointSet, oauth2::EndpointNotSet, oauth2::EndpointNotSet, oauth2::EndpointNotSet, oauth2::EndpointSet>;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClientProvider {
    Google,
    Facebook,
    Apple,
}

impl ClientProvider {
    pub const ALL: [ClientProvider; 3] =
        [ClientProvider::Google, ClientProvider::Facebook, ClientProvider::Apple];

    /// Provider id in the shape the identity toolkit expects.
    pub fn id(&self) -> &'static str {
        use ClientProvider::*;
        match self {
            Google => "google.com",
            Facebook => "facebook.com",
            Apple => "apple.com",
        }
    }

    /// Path segment used in /login/{provider} and /lockin/{provider}.
    pub fn slug(&self) -> &'static str {
        use ClientProvider::*;
        match self {
            Google => "google",
            Facebook => "facebook",
            Apple => "apple",
        }
    }

    pub fn scopes(&self) -> &'static [&'static str] {
        use ClientProvider::*;
        match self {
            Google => &["openid", "email", "profile"],
            Facebook => &["email", "public_profile"],
            Apple => &["name", "email"],
        }
    }

    fn endpoints(&self) -> (&'static str, &'static str) {
        use ClientProvider::*;
        match self {
            Google => (
                "https://accounts.google.com/o/oauth2/auth",
                "https://oauth2.googleapis.com/token",
            ),
            Facebook => (
                "https://www.facebook.com/v13.0/dialog/oauth",
                "https://graph.facebook.com/v13.0/oauth/access_token",
            ),
            Apple => (
                "https://appleid.apple.com/auth/authorize",
                "https://appleid.apple.com/auth/token",
            ),
        }
    }
}

impl fmt::Display for ClientProvider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone)]
pub struct Clients {
    pub(crate) firebase_idpurl: String,
    google_client: Option<HappyClient>,
    facebook_client: Option<HappyClient>,
    apple_client: Option<HappyClient>,
}

fn build_client(
    json: Option<&Value>,
    provider: ClientProvider,
    base_url: &str,
) -> AppResult<Option<HappyClient>> {
    let Some(json) = json else {
        return Ok(None);
    };
    let client_id = ClientId::new(json.get_str_field("client_id")?);
    let client_secret = ClientSecret::new(json.get_str_field("client_secret")?);

    let (auth, token) = provider.endpoints();
    let auth_url =
        AuthUrl::new(auth.to_owned()).map_err(|_| format!("bad auth url for {provider}"))?;
    let token_url =
        TokenUrl::new(token.to_owned()).map_err(|_| format!("bad token url for {provider}"))?;
    let redirect_url = RedirectUrl::new(format!("{base_url}/lockin/{}", provider.slug()))
        .map_err(|_| format!("bad redirect url for {provider}"))?;

    Ok(Some(
        BasicClient::new(client_id)
            .set_client_secret(client_secret)
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url),
    ))
}

impl Clients {
    /// Read provider keys from a client_secret.json. Any provider may be
    /// left out; it just won't show up on the login page.
    pub fn load(path: &str, base_url: &str) -> AppResult<Clients> {
        let raw = std::fs::read_to_string(path).map_err(|e| format!("reading {path}: {e}"))?;
        Clients::from_json(serde_json::from_str(&raw)?, base_url)
    }

    pub fn from_json(json: Value, base_url: &str) -> AppResult<Clients> {
        let firebase_idpurl = format!(
            "https://identitytoolkit.googleapis.com/v1/accounts:signInWithIdp?key={}",
            json.get_obj_field("firebase")?.get_str_field("apikey")?
        );
        Ok(Clients {
            firebase_idpurl,
            google_client: build_client(json.get("google"), ClientProvider::Google, base_url)?,
            facebook_client: build_client(json.get("facebook"), ClientProvider::Facebook, base_url)?,
            apple_client: build_client(json.get("apple"), ClientProvider::Apple, base_url)?,
        })
    }

    /// No providers at all. The app still serves everything that does not
    /// need sign-in.
    pub fn disabled() -> Clients {
        Clients {
            firebase_idpurl: String::new(),
            google_client: None,
            facebook_client: None,
            apple_client: None,
        }
    }

    fn client(&self, provider: ClientProvider) -> Option<&HappyClient> {
        use ClientProvider::*;
        match provider {
            Google => self.google_client.as_ref(),
            Facebook => self.facebook_client.as_ref(),
            Apple => self.apple_client.as_ref(),
        }
    }

    /// Providers with keys supplied, in login-page order.
    pub fn providers(&self) -> Vec<ClientProvider> {
        ClientProvider::ALL
            .into_iter()
            .filter(|p| self.client(*p).is_some())
            .collect()
    }

    pub fn get_client(&self, provider: ClientProvider) -> AppResult<HappyClient> {
        self.client(provider)
            .cloned()
            .ok_or(format!("OAuth provider {provider} keys not supplied").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_config_only_lists_supplied_providers() {
        let clients = Clients::from_json(
            json!({
                "firebase": {"apikey": "k"},
                "google": {"client_id": "id", "client_secret": "secret"},
            }),
            "http://localhost:8080",
        )
        .unwrap();

        assert_eq!(clients.providers(), vec![ClientProvider::Google]);
        assert!(clients.get_client(ClientProvider::Google).is_ok());
        assert!(clients.get_client(ClientProvider::Facebook).is_err());
        assert!(clients.firebase_idpurl.ends_with("key=k"));
    }

    #[test]
    fn full_config_lists_all_providers() {
        let keys = json!({"client_id": "id", "client_secret": "secret"});
        let clients = Clients::from_json(
            json!({
                "firebase": {"apikey": "k"},
                "google": keys.clone(),
                "facebook": keys.clone(),
                "apple": keys,
            }),
            "http://localhost:8080",
        )
        .unwrap();

        assert_eq!(clients.providers().len(), 3);
    }

    #[test]
    fn missing_firebase_key_is_an_error() {
        assert!(Clients::from_json(json!({}), "http://localhost:8080").is_err());
    }

    #[test]
    fn disabled_clients_reject_every_provider() {
        let clients = Clients::disabled();
        assert!(clients.providers().is_empty());
        assert!(clients.get_client(ClientProvider::Apple).is_err());
    }

    #[test]
    fn provider_ids_match_the_identity_toolkit() {
        assert_eq!(ClientProvider::Google.id(), "google.com");
        assert_eq!(ClientProvider::Facebook.slug(), "facebook");
        assert_eq!(ClientProvider::Apple.to_string(), "Apple");
    }
}
