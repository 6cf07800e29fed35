use crate::errors::Error;

/// Struct to assist deserializing the results of the count queries
#[derive(Debug, serde::Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct Count {
    count: u64,
}

impl Count {
    #[cfg(test)]
    pub const fn new(count: u64) -> Self {
        Self { count }
    }

    /// Unwrap the result of a count query, a `GROUP ALL` over no rows returns nothing at all.
    #[must_use]
    pub fn or_zero(result: Option<Self>) -> u64 {
        result.map_or(0, |c| c.count)
    }

    /// Count the number of items in a table.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or if the result cannot be deserialized.
    pub async fn count<C: surrealdb::Connection>(
        db: &surrealdb::Surreal<C>,
        table: &str,
    ) -> Result<u64, Error> {
        let result: Option<Self> = db.query(count(table)).await?.take(0)?;
        if result.is_none() {
            log::debug!("When counting entries in table {table}, no count was returned");
        }
        Ok(Self::or_zero(result))
    }
}

/// Query to count the number of items in a table.
///
/// Compiles to:
/// ```sql, ignore
/// SELECT count() FROM table GROUP ALL
/// ```
#[must_use]
pub fn count<Table: AsRef<str>>(table: Table) -> String {
    format!("SELECT count() FROM {} GROUP ALL", table.as_ref())
}

/// Query to count the items of a table matching a condition.
///
/// Compiles to:
/// ```sql, ignore
/// SELECT count() FROM table WHERE condition GROUP ALL
/// ```
#[must_use]
pub fn count_where<Table: AsRef<str>, Cond: AsRef<str>>(table: Table, condition: Cond) -> String {
    format!(
        "SELECT count() FROM {} WHERE {} GROUP ALL",
        table.as_ref(),
        condition.as_ref()
    )
}
