//! A module implementing a client for GraphQL endpoints, used for both the
//! subgraph indexer and the backend gateway.

use {
    alloy_primitives::Address,
    anyhow::{Context as _, Result, bail},
    reqwest::{Client, IntoUrl, Url},
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    serde_json::{Map, Value},
    std::fmt::{self, Display, Formatter},
};

/// Header the gateway reads the connected wallet address from.
pub const ACCOUNT_ADDRESS_HEADER: &str = "AccountAddress";

/// A general client for querying a GraphQL endpoint.
#[derive(Clone, Debug)]
pub struct GraphQlClient {
    client: Client,
    url: Url,
}

impl GraphQlClient {
    pub fn new(url: impl IntoUrl, client: Client) -> Result<Self> {
        Ok(Self {
            client,
            url: url.into_url()?,
        })
    }

    /// Performs the specified GraphQL query.
    pub async fn query<T>(&self, query: &str, variables: Option<Map<String, Value>>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send(None, query, variables).await
    }

    /// Performs the specified GraphQL query on behalf of a wallet, passing its
    /// address in the [`ACCOUNT_ADDRESS_HEADER`].
    pub async fn query_for_account<T>(
        &self,
        account: Address,
        query: &str,
        variables: Option<Map<String, Value>>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.send(Some(account), query, variables).await
    }

    async fn send<T>(
        &self,
        account: Option<Address>,
        query: &str,
        variables: Option<Map<String, Value>>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut request = self
            .client
            .post(self.url.clone())
            .json(&Query { query, variables });
        if let Some(account) = account {
            request = request.header(ACCOUNT_ADDRESS_HEADER, account.to_string());
        }

        let result: Result<T> = async {
            request
                .send()
                .await?
                .error_for_status()?
                .json::<QueryResponse<T>>()
                .await
                .context("malformed GraphQL response")?
                .into_result()
        }
        .await;
        if let Err(err) = &result {
            tracing::warn!(url = %self.url, ?err, "GraphQL query failed");
        }
        result
    }
}

/// A GraphQL query.
#[derive(Serialize)]
struct Query<'a> {
    query: &'a str,
    variables: Option<Map<String, Value>>,
}

/// A GraphQL query response.
///
/// This type gets converted into a Rust `Result` type, while handling invalid
/// responses (with missing data and errors).
#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    #[serde(default = "empty_data")]
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<QueryError>>,
}

impl<T> QueryResponse<T> {
    fn into_result(self) -> Result<T> {
        match self {
            Self {
                data: Some(data),
                errors: None,
            } => Ok(data),
            Self {
                errors: Some(errors),
                data: None,
            } if !errors.is_empty() => {
                // Make sure to log additional errors if there are more than
                // one, and just bubble up the first error.
                for error in &errors[1..] {
                    tracing::warn!("additional GraphQL error: {}", error.message);
                }
                bail!("{}", errors[0])
            }
            _ => bail!("invalid GraphQL response"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryError {
    message: String,
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Function to work around the fact that `#[serde(default)]` on an `Option<T>`
/// requires `T: Default`.
fn empty_data<T>() -> Option<T> {
    None
}

/// Formats an address the way indexers store them: lower case hex with a `0x`
/// prefix.
pub fn lower_hex(address: &Address) -> String {
    format!("{address:#x}")
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        serde_json::{Value, json},
    };

    #[test]
    fn serialize_query() {
        assert_eq!(
            serde_json::to_value(&Query {
                query: r#"foo {
                }"#,
                variables: Some(json_map! {
                    "foo" => "bar",
                    "baz" => 42,
                    "thing" => false,
                }),
            })
            .unwrap(),
            json!({
                "query": "foo {\n                }",
                "variables": {
                    "foo": "bar",
                    "baz": 42,
                    "thing": false,
                },
            }),
        );
    }

    fn response_from_json<T>(value: Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value::<QueryResponse<T>>(value)
            .unwrap()
            .into_result()
    }

    #[test]
    fn deserialize_successful_response() {
        assert!(response_from_json::<bool>(json!({ "data": true })).unwrap());
    }

    #[test]
    fn deserialize_error_response() {
        assert_eq!(
            response_from_json::<bool>(json!({
                "data": null,
                "errors": [{"message": "foo"}],
            }))
            .unwrap_err()
            .to_string(),
            "foo",
        );
        assert_eq!(
            response_from_json::<bool>(json!({
                "errors": [{"message": "bar"}],
            }))
            .unwrap_err()
            .to_string(),
            "bar",
        );
    }

    #[test]
    fn deserialize_multi_error_response() {
        assert_eq!(
            response_from_json::<bool>(json!({
                "data": null,
                "errors": [
                    {"message": "foo"},
                    {"message": "bar"},
                ],
            }))
            .unwrap_err()
            .to_string(),
            "foo",
        );
    }

    #[test]
    fn deserialize_invalid_response() {
        for response in [
            json!({ "data": null, "errors": null }),
            json!({ "data": null, "errors": [] }),
            json!({ "data": true, "errors": [] }),
            json!({ "data": true, "errors": [{"message": "bad"}] }),
        ] {
            assert!(response_from_json::<bool>(response).is_err());
        }
    }

    #[test]
    fn formats_addresses_in_lower_case() {
        let address: Address = "0x06Df3b2bbB68adc8B0e302443692037ED9f91b42"
            .parse()
            .unwrap();
        assert_eq!(
            lower_hex(&address),
            "0x06df3b2bbb68adc8b0e302443692037ed9f91b42"
        );
    }
}
