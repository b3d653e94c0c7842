use std::sync::Arc;

use tracing::instrument;

use crate::backend::{collections, select_as, Backend, Direction, Filter};
use crate::error::Result;
use crate::models::{Role, StaffMember};

pub struct StaffService {
    backend: Arc<dyn Backend>,
}

impl StaffService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<StaffMember>> {
        select_as(
            self.backend.as_ref(),
            collections::STAFF,
            &Filter::new().order_by("full_name", Direction::Asc),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn list_by_role(&self, role: Role) -> Result<Vec<StaffMember>> {
        select_as(
            self.backend.as_ref(),
            collections::STAFF,
            &Filter::new()
                .where_eq("role", role.as_str())
                .order_by("full_name", Direction::Asc),
        )
        .await
    }
}
