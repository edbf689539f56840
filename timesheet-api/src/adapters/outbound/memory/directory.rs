use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;

use crate::domain::{
    models::{Project, ProjectId, User, UserId},
    ports::outbound::Directory,
    TimesheetError,
};

/// Directory backed by in-memory maps.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    projects: Arc<RwLock<HashMap<ProjectId, Project>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: User) -> Self {
        self.put_user(user);
        self
    }

    pub fn with_project(self, project: Project) -> Self {
        self.put_project(project);
        self
    }

    /// Insert or replace a user.
    pub fn put_user(&self, user: User) {
        self.users.write().unwrap().insert(user.id, user);
    }

    /// Insert or replace a project.
    pub fn put_project(&self, project: Project) {
        self.projects.write().unwrap().insert(project.id, project);
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, TimesheetError> {
        Ok(self.users.read().unwrap().get(&id).cloned())
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, TimesheetError> {
        Ok(self.projects.read().unwrap().get(&id).cloned())
    }

    async fn get_projects(&self, ids: &[ProjectId]) -> Result<Vec<Project>, TimesheetError> {
        let projects = self.projects.read().unwrap();
        Ok(ids.iter().filter_map(|id| projects.get(id).cloned()).collect())
    }
}
