use crate::errors::AppError;
use crate::schema::admins::dsl as admins_dsl;
use diesel::dsl::exists;
use diesel::prelude::*;
use tracing::{debug, error};

pub(super) async fn run_query<T, F>(
    pool: &deadpool_diesel::postgres::Pool,
    query: F,
) -> Result<T, AppError>
where
    F: FnOnce(&mut diesel::PgConnection) -> Result<T, diesel::result::Error> + Send + 'static,
    T: Send + 'static,
{
    let conn = pool.get().await?;
    debug!("DB connection object obtained from pool for interaction");

    let res = conn.interact(query).await?;
    res.map_err(AppError::from)
}

/// Verifies that the acting principal carries the administrator role.
/// Every privileged handler calls this before touching any other table.
pub(super) async fn check_admin_role(
    pool: &deadpool_diesel::postgres::Pool,
    admin_id: i64,
) -> Result<(), AppError> {
    let is_admin = run_query(pool, move |conn| {
        diesel::select(exists(admins_dsl::admins.find(admin_id))).get_result::<bool>(conn)
    })
    .await?;

    if !is_admin {
        error!(
            "Principal {} is not a registered administrator. Rejecting request.",
            admin_id
        );
        return Err(AppError::Unauthorized(
            "Unauthorized: administrator role required".to_string(),
        ));
    }
    Ok(())
}
