use rusqlite::{Connection, TransactionBehavior};

use crate::db::{self, queries};
use crate::models::working_hour::default_week;
use crate::models::{Business, BusinessFields};
use crate::services::slug;

/// Slug probing is retried this many times when another writer claims the
/// same slug between the lookup and the insert.
const SLUG_ATTEMPTS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("this owner already has a business")]
    OwnerHasBusiness,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for OnboardingError {
    fn from(e: rusqlite::Error) -> Self {
        OnboardingError::Database(e.into())
    }
}

/// Creates a business together with its seven working-hour rows in one
/// transaction. The slug is derived from the name and unique across all
/// businesses.
pub fn create_business(
    conn: &mut Connection,
    owner_id: i64,
    fields: &BusinessFields,
    is_active: bool,
) -> Result<Business, OnboardingError> {
    let base = slug::slugify(&fields.name);

    for attempt in 1..=SLUG_ATTEMPTS {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if queries::get_business_by_owner(&tx, owner_id)?.is_some() {
            return Err(OnboardingError::OwnerHasBusiness);
        }

        let slug = slug::next_free_slug(&tx, &base)?;
        let business_id = match queries::insert_business(&tx, owner_id, &slug, fields, is_active) {
            Ok(id) => id,
            Err(e) if db::is_constraint_violation(&e) && attempt < SLUG_ATTEMPTS => {
                tracing::warn!(slug = %slug, attempt, "slug claimed concurrently, retrying");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        for (day, open, close, closed) in default_week() {
            queries::insert_working_hour(&tx, business_id, day, &open, &close, closed)?;
        }

        let business = queries::get_business(&tx, business_id)?
            .ok_or_else(|| anyhow::anyhow!("business {business_id} vanished after insert"))?;
        tx.commit()?;

        tracing::info!(business_id, slug = %business.slug, owner_id, "business created");
        return Ok(business);
    }

    Err(anyhow::anyhow!("could not assign a unique slug for {base}").into())
}
