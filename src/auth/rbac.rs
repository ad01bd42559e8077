#[derive(Debug, Clone, PartialEq)]
pub enum Permission {
    PostJobs,
    ChangeOwnPassword,
    EditOwnContactEmail,
    EditAnyContactEmail,
    ViewUnpublishedJobs,
    ModerateJobs,
    ModerateComments,
    ReviewApplications,
    ManageUsers,
    ReadAuditLog,
}

pub fn has_permission(role: &str, permission: &Permission) -> bool {
    match role {
        "ADMIN" => true,
        "USER" => matches!(
            permission,
            Permission::PostJobs | Permission::ChangeOwnPassword | Permission::EditOwnContactEmail
        ),
        _ => false,
    }
}
