use neatoo_core::SaveMeta;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub completed: bool,
}

/// Wire shape for `TaskFactory.Save`: `id` absent means insert, `deleted`
/// true means delete, otherwise update — decoded straight into a
/// [`SaveMeta`] implementor so `neatoo_factory::run_save` can route it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TaskEdit {
    pub id: Option<u64>,
    pub title: String,
    pub completed: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl SaveMeta for TaskEdit {
    fn is_new(&self) -> bool {
        self.id.is_none()
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}
