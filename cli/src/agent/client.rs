// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for pushing a deployment archive to an agent

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use thiserror::Error;

use launchpad_core::presentation::DEPLOYMENT_FIELD;
use launchpad_core::domain::workspace::ARCHIVE_FILE_NAME;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to send deployment: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Deployment failed with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

#[derive(Debug, Clone)]
pub struct DeployClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl DeployClient {
    pub fn new(server_url: &str, api_key: impl Into<String>) -> Result<Self, ClientError> {
        // No global timeout: large uploads over slow links are expected
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: server_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn deploy_url(&self) -> String {
        format!("{}/deploy", self.base_url)
    }

    /// Upload `archive` and return the agent's confirmation text
    ///
    /// One attempt only. Anything but 200 is an error carrying the status
    /// and the response body.
    pub async fn deploy(&self, archive: Vec<u8>) -> Result<String, ClientError> {
        let part = Part::bytes(archive)
            .file_name(ARCHIVE_FILE_NAME)
            .mime_str("application/zip")?;
        let form = Form::new().part(DEPLOYMENT_FIELD, part);

        let response = self
            .client
            .post(self.deploy_url())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status != StatusCode::OK {
            return Err(ClientError::Rejected { status, body });
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_deploy_sends_bearer_and_multipart() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/deploy")
            .match_header("authorization", "Bearer key-123")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="deployment""#.to_string()),
                Matcher::Regex(r#"filename="deployment.zip""#.to_string()),
                Matcher::Regex("PK-archive-bytes".to_string()),
            ]))
            .with_status(200)
            .with_body("Deployment started successfully in uploads/deploy-20260101-000000\n")
            .create_async()
            .await;

        let client = DeployClient::new(&format!("{}/", server.url()), "key-123").unwrap();
        let body = client.deploy(b"PK-archive-bytes".to_vec()).await.unwrap();

        assert!(body.starts_with("Deployment started successfully"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_ok_status_is_error_with_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/deploy")
            .with_status(401)
            .with_body("Invalid API key")
            .expect(1)
            .create_async()
            .await;

        let client = DeployClient::new(&server.url(), "wrong").unwrap();
        let err = client.deploy(vec![1, 2, 3]).await.unwrap_err();

        match err {
            ClientError::Rejected { status, body } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(body, "Invalid API key");
            }
            other => panic!("unexpected error {:?}", other),
        }
        // No retry
        mock.assert_async().await;
    }
}
