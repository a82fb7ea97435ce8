/// Authenticated caller, resolved from the bearer token by the auth
/// middleware and injected into the request extensions. Session rows are
/// provisioned by the auth service; this backend only consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: i64,
}
