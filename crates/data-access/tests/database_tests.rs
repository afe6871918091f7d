//! Entity operations against an in-memory SQLite database.

use chrono::NaiveDate;
use similar_asserts::assert_eq;
use uuid::Uuid;

use sqlexpr::{
    captured, col, Assignments, Error, Params, ReturnIdentity, SaveOutcome, TableCreation, Value,
};
use tests_common::database::{create_table, in_memory_database};
use tests_common::entities::{AuditEntry, Document, User};

fn names(users: &[User]) -> Vec<&str> {
    users.iter().map(|user| user.name.as_str()).collect()
}

async fn seeded_users() -> anyhow::Result<sqlexpr::Database> {
    let (database, _) = in_memory_database().await?;
    create_table::<User>(&database).await?;
    database
        .insert_all(&[
            User::new("Ann", 25).with_email("ann@example.com"),
            User::new("Bob", 30),
            User::new("Cid", 41).with_email("cid@example.com"),
        ])
        .await?;
    Ok(database)
}

#[tokio::test]
async fn filters_by_captured_value() -> anyhow::Result<()> {
    let database = seeded_users().await?;
    let min_age = 30;

    let mut query = database.query_builder::<User>();
    query
        .where_(&col("Age").ge(captured("min_age", min_age)))?
        .order_by(&col("Name"))?;
    let users: Vec<User> = database.select_query(&query).await?;
    assert_eq!(names(&users), vec!["Bob", "Cid"]);

    assert_eq!(database.count_query(&query).await?, 2);
    Ok(())
}

#[tokio::test]
async fn selects_rows_matching_a_predicate() -> anyhow::Result<()> {
    let (database, _) = in_memory_database().await?;
    create_table::<User>(&database).await?;
    for (name, age) in [("One", 20), ("Two", 30), ("Three", 40)] {
        database.save(&mut User::new(name, age)).await?;
    }

    let users: Vec<User> = database.select_where(&col("Age").ge(30)).await?;
    let mut ids = users.iter().map(|user| user.id).collect::<Vec<_>>();
    ids.sort_unstable();
    assert_eq!(ids, vec![2, 3]);
    Ok(())
}

#[tokio::test]
async fn raw_conditions_combine_with_predicates() -> anyhow::Result<()> {
    let database = seeded_users().await?;

    let mut query = database.query_builder::<User>();
    query
        .where_raw(
            "Age > @min_age",
            Params::from([("min_age".to_string(), Value::Int(26))]),
        )?
        .and(&col("Email").ends_with("@example.com"))?;
    let users: Vec<User> = database.select_query(&query).await?;
    assert_eq!(names(&users), vec!["Cid"]);
    Ok(())
}

#[tokio::test]
async fn save_inserts_then_updates() -> anyhow::Result<()> {
    let (database, _) = in_memory_database().await?;
    create_table::<User>(&database).await?;

    let mut user = User::new("Ann", 25);
    let outcome = database.save(&mut user).await?;
    assert_eq!(outcome, SaveOutcome::Inserted { id: Value::Int(1) });
    assert_eq!(user.id, 1);

    user.age = 26;
    let outcome = database.save(&mut user).await?;
    assert_eq!(outcome, SaveOutcome::Updated { rows: 1 });

    let stored: Option<User> = database.single_by_id::<User>(1).await?;
    assert_eq!(stored, Some(user));

    // a key that was never stored updates nothing
    let mut stranger = User::new("Zed", 50);
    stranger.id = 42;
    let outcome = database.save(&mut stranger).await?;
    assert_eq!(outcome, SaveOutcome::Updated { rows: 0 });
    Ok(())
}

#[tokio::test]
async fn save_assigns_uuid_keys() -> anyhow::Result<()> {
    let (database, _) = in_memory_database().await?;
    create_table::<Document>(&database).await?;

    let created_at = NaiveDate::from_ymd_opt(2024, 3, 9)
        .and_then(|date| date.and_hms_opt(7, 5, 1))
        .unwrap();
    let mut document = Document {
        id: Uuid::nil(),
        title: "Notes".to_string(),
        published: true,
        created_at,
    };

    let SaveOutcome::Inserted { id } = database.save(&mut document).await? else {
        panic!("expected the document to be inserted");
    };
    assert!(!document.id.is_nil());
    assert_eq!(id, Value::Uuid(document.id));

    let stored: Option<Document> = database.single_by_id::<Document>(document.id).await?;
    assert_eq!(stored, Some(document));
    Ok(())
}

#[tokio::test]
async fn inserts_can_return_the_generated_key() -> anyhow::Result<()> {
    let (database, _) = in_memory_database().await?;
    create_table::<User>(&database).await?;

    let first = database
        .insert(&User::new("Ann", 25), ReturnIdentity::Fetch)
        .await?;
    let skipped = database
        .insert(&User::new("Bob", 30), ReturnIdentity::Skip)
        .await?;
    let third = database
        .insert(&User::new("Cid", 41), ReturnIdentity::Fetch)
        .await?;
    assert_eq!((first, skipped, third), (1, 0, 3));
    Ok(())
}

#[tokio::test]
async fn first_requires_a_match() -> anyhow::Result<()> {
    let database = seeded_users().await?;
    let predicate = col("Name").eq("Nobody");

    assert!(matches!(
        database.first::<User>(&predicate).await,
        Err(Error::NoMatchingRow(table)) if table == "users"
    ));
    assert_eq!(database.first_or_default::<User>(&predicate).await?, None);

    let bob: User = database.first(&col("Name").starts_with("B")).await?;
    assert_eq!(bob.age, 30);
    assert_eq!(
        database
            .single_where::<User>(&col("Email").eq("cid@example.com"))
            .await?
            .map(|user| user.name),
        Some("Cid".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn counts_and_existence() -> anyhow::Result<()> {
    let database = seeded_users().await?;

    assert_eq!(database.count::<User>(None).await?, 3);
    assert_eq!(
        database
            .count::<User>(Some(&col("Email").eq(Value::Null)))
            .await?,
        1
    );
    assert!(database.exists::<User>(&col("Age").gt(40)).await?);
    assert!(!database.exists::<User>(&col("Age").gt(90)).await?);
    Ok(())
}

#[tokio::test]
async fn updates() -> anyhow::Result<()> {
    let database = seeded_users().await?;

    let rows = database
        .update_only::<User>(
            &Assignments::new().set("Age", 50),
            &col("Age").ge(30),
        )
        .await?;
    assert_eq!(rows, 2);
    assert_eq!(database.count::<User>(Some(&col("Age").eq(50))).await?, 2);

    let mut users: Vec<User> = database.select_all().await?;
    for user in &mut users {
        user.age += 1;
    }
    assert_eq!(database.update_all(&users).await?, 3);

    let ann: Option<User> = database.single_where(&col("Name").eq("Ann")).await?;
    assert_eq!(ann.map(|user| user.age), Some(26));
    Ok(())
}

#[tokio::test]
async fn deletes() -> anyhow::Result<()> {
    let database = seeded_users().await?;
    let users: Vec<User> = database.select_all().await?;

    assert_eq!(database.delete(&users[0]).await?, 1);
    assert_eq!(database.delete_by_id::<User>(users[1].id).await?, 1);
    assert_eq!(database.delete_by_id::<User>(users[1].id).await?, 0);
    assert_eq!(database.delete_all::<User>(&[]).await?, 0);
    assert_eq!(database.delete_all(&users).await?, 1);
    assert_eq!(database.count::<User>(None).await?, 0);

    database.insert_all(&users).await?;
    assert_eq!(database.delete_where::<User>(&col("Age").lt(35)).await?, 2);
    assert_eq!(database.count::<User>(None).await?, 1);
    Ok(())
}

#[tokio::test]
async fn tables_are_created_once() -> anyhow::Result<()> {
    let (database, _) = in_memory_database().await?;

    assert!(!database.table_exists::<User>().await?);
    assert_eq!(
        database.create_table_if_not_exists::<User>().await?,
        TableCreation::Created
    );
    assert!(database.table_exists::<User>().await?);
    assert_eq!(
        database.create_table_if_not_exists::<User>().await?,
        TableCreation::AlreadyExisted
    );
    Ok(())
}

#[tokio::test]
async fn keyless_entities_cannot_be_addressed_by_key() -> anyhow::Result<()> {
    let (database, _) = in_memory_database().await?;
    create_table::<AuditEntry>(&database).await?;

    let entry = AuditEntry {
        message: "started".to_string(),
    };
    database.insert(&entry, ReturnIdentity::Skip).await?;
    assert_eq!(database.select_all::<AuditEntry>().await?, vec![entry.clone()]);

    assert!(matches!(
        database.delete(&entry).await,
        Err(Error::MissingKeyDescriptor(table)) if table == "audit_entries"
    ));
    assert!(matches!(
        database.update(&entry).await,
        Err(Error::MissingKeyDescriptor(_))
    ));
    Ok(())
}

#[tokio::test]
async fn statements_are_counted() -> anyhow::Result<()> {
    let (database, metrics) = in_memory_database().await?;
    create_table::<User>(&database).await?;
    let before = metrics.statements_total.get();

    database.select_all::<User>().await?;
    database.count::<User>(None).await?;
    assert_eq!(metrics.statements_total.get(), before + 2);
    Ok(())
}
