use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::*;
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    config::MpesaConfig,
    data_objects::{AccessTokenResponse, StkPushRequest, StkPushResponse, StkQueryRequest},
    helpers::{daraja_timestamp, generate_password, normalize_phone},
    MpesaApiError,
};

const TOKEN_PATH: &str = "/oauth/v1/generate";
const STK_PUSH_PATH: &str = "/mpesa/stkpush/v1/processrequest";
const STK_QUERY_PATH: &str = "/mpesa/stkpushquery/v1/query";
const TRANSACTION_TYPE: &str = "CustomerPayBillOnline";
/// Tokens are refreshed this long before Daraja says they expire.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3599;

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct MpesaApi {
    config: MpesaConfig,
    client: Arc<Client>,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl MpesaApi {
    pub fn new(config: MpesaConfig) -> Result<Self, MpesaApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MpesaApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), token: Arc::new(Mutex::new(None)) })
    }

    pub fn config(&self) -> &MpesaConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url())
    }

    /// Returns a valid OAuth bearer token, fetching a new one only when the cached token is missing or about to expire.
    pub async fn access_token(&self) -> Result<String, MpesaApiError> {
        let mut cache = self.token.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.expires_at > Utc::now() {
                trace!("📲️ Using cached M-PESA access token");
                return Ok(cached.token.clone());
            }
        }
        debug!("📲️ Fetching a new M-PESA access token");
        let response = self
            .client
            .get(self.url(TOKEN_PATH))
            .query(&[("grant_type", "client_credentials")])
            .basic_auth(self.config.consumer_key.reveal(), Some(self.config.consumer_secret.reveal()))
            .send()
            .await
            .map_err(MpesaApiError::from_reqwest)?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!("📲️ M-PESA refused to issue an access token. {status}: {message}");
            return Err(MpesaApiError::AuthenticationFailed(format!("Error {status}. {message}")));
        }
        let token = response
            .json::<AccessTokenResponse>()
            .await
            .map_err(|e| MpesaApiError::AuthenticationFailed(e.to_string()))?;
        let lifetime = token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        let expires_at = Utc::now() + Duration::seconds((lifetime - TOKEN_EXPIRY_MARGIN_SECS).max(0));
        *cache = Some(CachedToken { token: token.access_token.clone(), expires_at });
        info!("📲️ Obtained M-PESA access token, valid until {expires_at}");
        Ok(token.access_token)
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, MpesaApiError> {
        let token = self.access_token().await?;
        let url = self.url(path);
        trace!("📲️ Sending REST query: {url}");
        let mut req = self.client.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(MpesaApiError::from_reqwest)?;
        if response.status().is_success() {
            trace!("📲️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| MpesaApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(MpesaApiError::from_reqwest)?;
            Err(MpesaApiError::QueryError { status, message })
        }
    }

    /// Sends an STK push prompt to the customer's phone. `amount` is in whole currency units.
    pub async fn stk_push(
        &self,
        phone: &str,
        amount: i64,
        account_reference: &str,
        description: &str,
    ) -> Result<StkPushResponse, MpesaApiError> {
        let phone = normalize_phone(phone);
        let timestamp = daraja_timestamp(Utc::now());
        let password = generate_password(&self.config.shortcode, self.config.passkey.reveal(), &timestamp);
        let request = StkPushRequest {
            business_short_code: self.config.shortcode.clone(),
            password,
            timestamp,
            transaction_type: TRANSACTION_TYPE.to_string(),
            amount,
            party_a: phone.clone(),
            party_b: self.config.shortcode.clone(),
            phone_number: phone,
            callback_url: self.config.callback_url.clone(),
            account_reference: account_reference.to_string(),
            transaction_desc: description.to_string(),
        };
        debug!("📲️ Requesting STK push of {amount} for {account_reference}");
        let response = self.rest_query::<StkPushResponse, _>(Method::POST, STK_PUSH_PATH, Some(request)).await?;
        if response.is_accepted() {
            info!(
                "📲️ STK push for {account_reference} accepted. CheckoutRequestID: {}",
                response.checkout_request_id
            );
            Ok(response)
        } else {
            warn!(
                "📲️ STK push for {account_reference} rejected. Code {}: {}",
                response.response_code, response.response_description
            );
            Err(MpesaApiError::Rejected {
                code: response.response_code,
                description: response.response_description,
            })
        }
    }

    /// Asks Daraja for the status of an earlier STK push. The response is returned untouched.
    pub async fn stk_query(&self, checkout_request_id: &str) -> Result<Value, MpesaApiError> {
        let timestamp = daraja_timestamp(Utc::now());
        let password = generate_password(&self.config.shortcode, self.config.passkey.reveal(), &timestamp);
        let request = StkQueryRequest {
            business_short_code: self.config.shortcode.clone(),
            password,
            timestamp,
            checkout_request_id: checkout_request_id.to_string(),
        };
        debug!("📲️ Querying STK push status for {checkout_request_id}");
        self.rest_query::<Value, _>(Method::POST, STK_QUERY_PATH, Some(request)).await
    }
}
