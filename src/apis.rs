pub mod gizmo;
pub mod google_sheets;
