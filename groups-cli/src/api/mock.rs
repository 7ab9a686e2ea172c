//! In-memory directory used by tests

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::directory::DirectoryService;
use super::models::{GroupHandle, GroupRequest};
use super::operations::Operation;

/// Records every call and fails the ones it was told to fail
#[derive(Default)]
pub struct MockDirectory {
    calls: Mutex<Vec<Operation>>,
    requests: Mutex<Vec<GroupRequest>>,
    create_failures: HashMap<String, String>,
    member_failures: HashMap<String, String>,
    hide_failures: HashMap<String, String>,
    assigned_mail: HashMap<String, String>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_create(mut self, address: &str, message: &str) -> Self {
        self.create_failures
            .insert(address.to_string(), message.to_string());
        self
    }

    pub fn fail_member(mut self, member: &str, message: &str) -> Self {
        self.member_failures
            .insert(member.to_string(), message.to_string());
        self
    }

    pub fn fail_hide(mut self, address: &str, message: &str) -> Self {
        self.hide_failures
            .insert(address.to_string(), message.to_string());
        self
    }

    /// Report `mail` as the address the directory gave `address`
    pub fn assign_mail(mut self, address: &str, mail: &str) -> Self {
        self.assigned_mail
            .insert(address.to_string(), mail.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Operation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<GroupRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls_for(&self, group: &str) -> Vec<Operation> {
        self.calls()
            .into_iter()
            .filter(|op| op.group() == group)
            .collect()
    }
}

#[async_trait]
impl DirectoryService for MockDirectory {
    async fn create_group(&self, request: &GroupRequest) -> Result<GroupHandle> {
        self.calls.lock().unwrap().push(Operation::create_group(
            request.address.clone(),
            request.members.clone(),
        ));
        self.requests.lock().unwrap().push(request.clone());

        if let Some(message) = self.create_failures.get(&request.address) {
            return Err(anyhow!("{}", message));
        }
        if let Some(message) = request
            .members
            .iter()
            .find_map(|m| self.member_failures.get(m))
        {
            return Err(anyhow!("{}", message));
        }

        Ok(GroupHandle {
            id: uuid::Uuid::new_v4().to_string(),
            address: request.address.clone(),
            display_name: request.display_name.clone(),
            mail: Some(
                self.assigned_mail
                    .get(&request.address)
                    .cloned()
                    .unwrap_or_else(|| request.address.clone()),
            ),
        })
    }

    async fn add_member(&self, group: &GroupHandle, member: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Operation::add_member(group.address.clone(), member));

        match self.member_failures.get(member) {
            Some(message) => Err(anyhow!("{}", message)),
            None => Ok(()),
        }
    }

    async fn set_hidden(&self, group: &GroupHandle, hidden: bool) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Operation::set_hidden(group.address.clone(), hidden));

        match self.hide_failures.get(&group.address) {
            Some(message) => Err(anyhow!("{}", message)),
            None => Ok(()),
        }
    }
}
