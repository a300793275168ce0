mod part_ids;
mod protection;
mod uv_project;

pub use part_ids::AssignPartIds;
pub use protection::WriteProtectionMask;
pub use uv_project::ProjectUvs;
