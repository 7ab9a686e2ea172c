//! Microsoft Graph implementation of the directory service

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

use super::auth::AuthManager;
use super::directory::DirectoryService;
use super::models::{
    CreateGroupBody, DirectoryObjectRef, GraphErrorEnvelope, GraphGroup, GraphObjectId,
    GroupHandle, GroupRequest, HideFromAddressListsBody, Restriction,
};

pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";

/// Error returned by Graph for a failed request.
///
/// Displays the upstream message verbatim so it can be written to the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphApiError {
    pub status: StatusCode,
    pub code: Option<String>,
    pub message: String,
}

impl GraphApiError {
    fn from_body(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<GraphErrorEnvelope>(body) {
            Ok(envelope) if !envelope.error.message.is_empty() => Self {
                status,
                code: Some(envelope.error.code).filter(|c| !c.is_empty()),
                message: envelope.error.message,
            },
            _ => Self {
                status,
                code: None,
                message: if body.trim().is_empty() {
                    status.to_string()
                } else {
                    format!("{}: {}", status, body.trim())
                },
            },
        }
    }
}

impl fmt::Display for GraphApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GraphApiError {}

/// Directory client backed by the Graph REST API
pub struct GraphDirectory {
    http: reqwest::Client,
    auth: Arc<AuthManager>,
    base_url: String,
}

impl GraphDirectory {
    pub fn new(http: reqwest::Client, auth: Arc<AuthManager>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            auth,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn object_url(&self, id: &str) -> String {
        self.url(&format!("directoryObjects/{}", id))
    }

    /// Look up the object id of a user identity (UPN, mail or object id)
    async fn resolve_user(&self, identity: &str) -> Result<String> {
        let url = self.url(&format!(
            "users/{}?$select=id",
            urlencoding::encode(identity.trim())
        ));
        let user: GraphObjectId = self.send_json(self.http.get(url)).await?;
        Ok(user.id)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        response
            .json::<T>()
            .await
            .context("Failed to parse Graph response")
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        let token = self.auth.access_token().await?;
        let response = builder
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::debug!("Graph request failed {}: {}", status, body);
            Err(GraphApiError::from_body(status, &body).into())
        }
    }
}

fn visibility(join: Restriction) -> &'static str {
    match join {
        Restriction::Open => "Public",
        Restriction::Closed | Restriction::ApprovalRequired => "Private",
    }
}

#[async_trait]
impl DirectoryService for GraphDirectory {
    async fn create_group(&self, request: &GroupRequest) -> Result<GroupHandle> {
        let mut owners = Vec::new();
        if let Some(owner) = &request.owner {
            owners.push(self.object_url(&self.resolve_user(owner).await?));
        }

        let mut members = Vec::with_capacity(request.members.len());
        for member in &request.members {
            members.push(self.object_url(&self.resolve_user(member).await?));
        }

        if request.depart_restriction != request.join_restriction {
            log::debug!(
                "Depart restriction {} for {} is not separately supported, using join restriction {}",
                request.depart_restriction,
                request.address,
                request.join_restriction
            );
        }

        let body = CreateGroupBody {
            display_name: request.display_name.clone(),
            mail_nickname: request.mail_nickname().to_string(),
            mail_enabled: true,
            security_enabled: false,
            group_types: vec!["Unified".to_string()],
            visibility: visibility(request.join_restriction).to_string(),
            owners,
            members,
        };

        let group: GraphGroup = self
            .send_json(self.http.post(self.url("groups")).json(&body))
            .await?;

        Ok(GroupHandle {
            id: group.id,
            address: request.address.clone(),
            display_name: request.display_name.clone(),
            mail: group.mail,
        })
    }

    async fn add_member(&self, group: &GroupHandle, member: &str) -> Result<()> {
        let member_id = self.resolve_user(member).await?;
        let body = DirectoryObjectRef {
            odata_id: self.object_url(&member_id),
        };
        let url = self.url(&format!("groups/{}/members/$ref", group.id));
        self.send(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    async fn set_hidden(&self, group: &GroupHandle, hidden: bool) -> Result<()> {
        let body = HideFromAddressListsBody {
            hide_from_address_lists: hidden,
        };
        let url = self.url(&format!("groups/{}", group.id));
        self.send(self.http.patch(url).json(&body)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Principal;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn directory(server: &MockServer) -> GraphDirectory {
        Mock::given(method("POST"))
            .and(path("/tenant/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok",
                "expires_in": 3600
            })))
            .mount(server)
            .await;

        let http = reqwest::Client::new();
        let auth = Arc::new(AuthManager::new(http.clone(), server.uri()));
        auth.open_session(&Principal {
            tenant_id: "tenant".to_string(),
            client_id: "app".to_string(),
            client_secret: "secret".to_string(),
        })
        .await
        .unwrap();

        GraphDirectory::new(http, auth, format!("{}/v1.0", server.uri()))
    }

    fn request() -> GroupRequest {
        GroupRequest {
            display_name: "Sales".to_string(),
            address: "sales@contoso.com".to_string(),
            owner: Some("boss@contoso.com".to_string()),
            join_restriction: Restriction::Closed,
            depart_restriction: Restriction::Closed,
            members: vec![],
        }
    }

    #[test]
    fn test_graph_error_message_verbatim() {
        let body = r#"{"error":{"code":"Request_BadRequest","message":"Another object with the same value for property proxyAddresses already exists."}}"#;
        let err = GraphApiError::from_body(StatusCode::BAD_REQUEST, body);
        assert_eq!(
            err.to_string(),
            "Another object with the same value for property proxyAddresses already exists."
        );
        assert_eq!(err.code.as_deref(), Some("Request_BadRequest"));
    }

    #[test]
    fn test_graph_error_non_json_body() {
        let err = GraphApiError::from_body(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "502 Bad Gateway: upstream down");
        assert_eq!(err.code, None);
    }

    #[test]
    fn test_visibility_mapping() {
        assert_eq!(visibility(Restriction::Closed), "Private");
        assert_eq!(visibility(Restriction::Open), "Public");
    }

    #[tokio::test]
    async fn test_create_group_binds_owner() {
        let server = MockServer::start().await;
        let graph = directory(&server).await;

        Mock::given(method("GET"))
            .and(path("/v1.0/users/boss%40contoso.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "owner-id"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1.0/groups"))
            .and(body_partial_json(json!({
                "displayName": "Sales",
                "mailNickname": "sales",
                "visibility": "Private"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "group-id",
                "mail": "sales@contoso.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let handle = graph.create_group(&request()).await.unwrap();
        assert_eq!(handle.id, "group-id");
        assert_eq!(handle.address, "sales@contoso.com");
        assert_eq!(handle.assigned_elsewhere(), None);
    }

    #[tokio::test]
    async fn test_create_group_reports_assigned_mail() {
        let server = MockServer::start().await;
        let graph = directory(&server).await;

        Mock::given(method("POST"))
            .and(path("/v1.0/groups"))
            .and(body_partial_json(json!({"mailNickname": "sales"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "group-id",
                "mail": "sales@contoso.onmicrosoft.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = GroupRequest {
            address: "sales@fabrikam.com".to_string(),
            owner: None,
            ..request()
        };
        let handle = graph.create_group(&request).await.unwrap();
        assert_eq!(handle.address, "sales@fabrikam.com");
        assert_eq!(handle.assigned_elsewhere(), Some("sales@contoso.onmicrosoft.com"));
    }

    #[tokio::test]
    async fn test_add_member_reports_unknown_user() {
        let server = MockServer::start().await;
        let graph = directory(&server).await;

        Mock::given(method("GET"))
            .and(path("/v1.0/users/ghost%40contoso.com"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {
                    "code": "Request_ResourceNotFound",
                    "message": "Resource 'ghost@contoso.com' does not exist."
                }
            })))
            .mount(&server)
            .await;

        let group = GroupHandle {
            id: "group-id".to_string(),
            address: "sales@contoso.com".to_string(),
            display_name: "Sales".to_string(),
            mail: None,
        };
        let err = graph.add_member(&group, "ghost@contoso.com").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Resource 'ghost@contoso.com' does not exist."
        );
    }

    #[tokio::test]
    async fn test_set_hidden_patches_group() {
        let server = MockServer::start().await;
        let graph = directory(&server).await;

        Mock::given(method("PATCH"))
            .and(path("/v1.0/groups/group-id"))
            .and(body_partial_json(json!({"hideFromAddressLists": true})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let group = GroupHandle {
            id: "group-id".to_string(),
            address: "sales@contoso.com".to_string(),
            display_name: "Sales".to_string(),
            mail: None,
        };
        graph.set_hidden(&group, true).await.unwrap();
    }
}
