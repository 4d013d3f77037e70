use simplimedi::{
    config::Config,
    vectara::{CorpusTarget, Credential, QueryRequest, VectaraClient},
};

fn live_config() -> Config {
    let _ = dotenvy::dotenv();
    Config::from_env().expect("live tests need the Vectara credentials in the environment")
}

#[tokio::test]
#[ignore = "Requires live Vectara credentials"]
async fn live_token_issued() {
    let config = live_config();
    let client = VectaraClient::from_config(&config).expect("client");
    let token = client
        .fetch_token()
        .await
        .expect("failed to request access token");
    assert!(!token.as_str().is_empty(), "token must not be empty");
}

#[tokio::test]
#[ignore = "Requires live Vectara corpus"]
async fn live_query_returns_summary() {
    let config = live_config();
    let client = VectaraClient::from_config(&config).expect("client");
    let token = client.get_jwt_token().await.expect("access token");
    let request = QueryRequest::new(
        CorpusTarget::querying(&config),
        "What medications is the patient taking?",
    );
    let result = client
        .query_corpus(&Credential::from(token), &request)
        .await
        .expect("query failed");
    assert!(
        !result.summary.trim().is_empty(),
        "summary should be generated: {result:?}"
    );
}
