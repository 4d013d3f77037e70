//! Corpus administration (API-key authenticated).

use crate::vectara::client::VectaraClient;
use crate::vectara::types::{
    CorpusDefinition, CreateCorpusResponse, CreatedCorpus, Credential, VectaraError,
};
use reqwest::Method;
use serde_json::json;

impl CorpusDefinition {
    /// Render the JSON body posted to `/v1/create-corpus`.
    pub fn to_body(&self) -> serde_json::Value {
        json!({
            "corpus": {
                "name": self.name,
                "description": self.description,
                "enabled": true,
                "swapQenc": false,
                "swapIenc": false,
                "textless": false,
                "encrypted": true,
                "encoderId": 1,
                "metadataMaxBytes": 0,
                "customDimensions": [],
                "filterAttributes": []
            }
        })
    }
}

impl VectaraClient {
    /// Create a new corpus owned by `customer_id`, returning its identifier.
    pub async fn create_corpus(
        &self,
        credential: &Credential,
        host: &str,
        customer_id: u64,
        definition: &CorpusDefinition,
    ) -> Result<CreatedCorpus, VectaraError> {
        let builder = self
            .request(Method::POST, host, "v1/create-corpus")?
            .header("customer-id", customer_id.to_string())
            .header("accept", "application/json");
        let response = credential
            .apply(builder)?
            .json(&definition.to_body())
            .send()
            .await?;

        if !Self::is_success(response.status()) {
            return Err(Self::unexpected_status(response, "create-corpus").await);
        }

        let payload: CreateCorpusResponse = response
            .json()
            .await
            .map_err(|err| VectaraError::MalformedResponse(err.to_string()))?;

        if let Some(status) = payload.status.as_ref()
            && !status.code.is_empty()
            && !status.is_ok()
        {
            tracing::error!(status = %status, "Corpus creation rejected by Vectara");
            return Err(VectaraError::CorpusRejected {
                status: status.clone(),
            });
        }

        tracing::info!(
            corpus = %definition.name,
            corpus_id = payload.corpus_id,
            "Corpus created"
        );
        Ok(CreatedCorpus {
            corpus_id: payload.corpus_id,
            status_detail: payload.status.and_then(|status| status.status_detail),
        })
    }
}
