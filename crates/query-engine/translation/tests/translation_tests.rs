mod common;

use chrono::NaiveDate;

use query_engine_sql::sql::string::Params;
use query_engine_sql::sql::{Dialect, Value};
use query_engine_translation::translation::error::Error;
use query_engine_translation::translation::evaluate::EvaluationError;
use query_engine_translation::translation::expression::{
    captured, captured_with, col, lit, member_path, Capture, Expr,
};
use query_engine_translation::translation::options::{EvaluationFailure, TranslationOptions};
use query_engine_translation::translation::query::filtering::translate_predicate_with;
use query_engine_translation::translation::query::{
    translate_assignments, translate_predicate, Assignments, QueryBuilder,
};
use query_engine_translation::translation::statements::{self, ColumnValues, StatementContext};

fn embedded(expr: &Expr) -> String {
    translate_predicate(expr, Dialect::Embedded).unwrap().sql
}

fn client_server(expr: &Expr) -> String {
    translate_predicate(expr, Dialect::ClientServer).unwrap().sql
}

fn fallback() -> TranslationOptions {
    TranslationOptions::new(EvaluationFailure::Fallback)
}

fn broken() -> Expr {
    captured_with(
        "broken",
        Capture::new(|| Err(EvaluationError::Captured("boom".to_string()))),
    )
}

mod predicates {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn values_are_always_parameterized() {
        let sql = translate_predicate(&col("Name").eq("O'Brien"), Dialect::Embedded).unwrap();
        assert_eq!(sql.sql, "Name = @p0");
        assert_eq!(sql.params.get("p0"), Some(&Value::from("O'Brien")));
        assert!(!sql.sql.contains("Brien"));
    }

    #[test]
    fn contains_is_a_like_per_dialect() {
        let expr = col("Email").contains("@x.com");

        let sql = translate_predicate(&expr, Dialect::ClientServer).unwrap();
        insta::assert_snapshot!(sql.sql, @"`Email` LIKE CONCAT('%', @p0, '%')");
        assert_eq!(sql.params.get("p0"), Some(&Value::from("@x.com")));

        insta::assert_snapshot!(embedded(&expr), @"Email LIKE '%' || @p0 || '%'");
    }

    #[test]
    fn prefix_and_suffix_matching() {
        assert_eq!(
            embedded(&col("Name").starts_with("an")),
            "Name LIKE @p0 || '%'"
        );
        assert_eq!(
            client_server(&col("Name").ends_with("son")),
            "`Name` LIKE CONCAT('%', @p0)"
        );
    }

    #[test]
    fn arithmetic_on_the_right_is_evaluated_host_side() {
        let sql = translate_predicate(&col("Age").gt(lit(5) + 3), Dialect::Embedded).unwrap();
        insta::assert_snapshot!(common::render(&sql), @r###"
        Age > @p0

        {"p0": Int(8)}
        "###);
    }

    #[test]
    fn captured_values_are_bound() {
        let min_age = 30;
        let sql = translate_predicate(
            &col("Age").ge(captured("min_age", min_age) - 5),
            Dialect::ClientServer,
        )
        .unwrap();
        assert_eq!(sql.sql, "`Age` >= @p0");
        insta::assert_json_snapshot!(sql.params, @r###"
        {
          "p0": {
            "Int": 25
          }
        }
        "###);
    }

    #[test]
    fn logical_operators_are_not_parenthesized() {
        let expr = col("Age").eq(1) | col("Age").eq(2) & col("Name").eq("x");
        assert_eq!(
            embedded(&expr),
            "Age = @p0 OR Age = @p1 AND Name = @p2"
        );
    }

    #[test]
    fn not_is_always_parenthesized() {
        assert_eq!(
            embedded(&!col("Age").lt(18)),
            "NOT (Age < @p0)"
        );
        assert_eq!(embedded(&!col("Active")), "NOT (Active)");
    }

    #[test]
    fn conversions_are_transparent() {
        assert_eq!(embedded(&col("Age").convert().ge(30)), "Age >= @p0");
    }

    #[test]
    fn reserved_words_are_escaped() {
        assert_eq!(embedded(&col("Order").eq(1)), "[Order] = @p0");
        assert_eq!(client_server(&col("notes").eq(1)), "`notes` = @p0");
    }

    #[test]
    fn null_comparisons_use_is_null() {
        assert_eq!(embedded(&col("Email").eq(Value::Null)), "Email IS NULL");
        assert_eq!(
            embedded(&col("Email").ne(lit(Option::<String>::None))),
            "Email IS NOT NULL"
        );
        let sql = translate_predicate(&col("Email").eq(Value::Null), Dialect::Embedded).unwrap();
        assert!(sql.params.is_empty());
    }

    #[test]
    fn membership_binds_each_element() {
        let ids = Value::list([1, 2, 3]);
        let sql = translate_predicate(
            &col("Id").is_in(captured("ids", ids.clone())),
            Dialect::Embedded,
        )
        .unwrap();
        assert_eq!(sql.sql, "Id IN (@p0, @p1, @p2)");
        assert_eq!(
            sql.params.values().cloned().collect::<Vec<_>>(),
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );

        let static_form = Expr::call_static("Contains", vec![captured("ids", ids.clone()), col("Id")]);
        assert_eq!(embedded(&static_form), "Id IN (@p0, @p1, @p2)");

        let receiver_form = captured("ids", ids).contains(col("Id"));
        assert_eq!(embedded(&receiver_form), "Id IN (@p0, @p1, @p2)");
        assert_eq!(client_server(&receiver_form), "`Id` IN (@p0, @p1, @p2)");
    }

    #[test]
    fn a_captured_string_can_contain_a_column() {
        let sql = translate_predicate(
            &captured("haystack", "abc").contains(col("Name")),
            Dialect::Embedded,
        )
        .unwrap();
        assert_eq!(sql.sql, "@p0 LIKE '%' || Name || '%'");
        assert_eq!(sql.params.get("p0"), Some(&Value::from("abc")));
    }

    #[test]
    fn membership_in_an_empty_collection_never_matches() {
        let empty: Vec<i64> = vec![];
        assert_eq!(
            embedded(&col("Id").is_in(captured("ids", Value::list(empty)))),
            "1 = 0"
        );
    }

    #[test]
    fn unknown_methods_are_rejected() {
        let expr = col("Name").call_named("PadLeft", vec![lit(5)]).eq("x");
        assert!(matches!(
            translate_predicate(&expr, Dialect::Embedded),
            Err(Error::UnsupportedExpression(_))
        ));
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let expr = col("Name").call_named("StartsWith", vec![lit("a"), lit("b")]);
        assert!(matches!(
            translate_predicate(&expr, Dialect::Embedded),
            Err(Error::UnsupportedExpression(_))
        ));
    }

    #[test]
    fn arithmetic_as_a_condition_is_rejected() {
        for expr in [lit(1) + 2, (col("Age") + 1).gt(3), -col("Age")] {
            assert!(
                matches!(
                    translate_predicate(&expr, Dialect::Embedded),
                    Err(Error::UnsupportedExpression(_))
                ),
                "{expr} should be rejected"
            );
        }
    }

    #[test]
    fn nested_members_are_rejected() {
        let expr = member_path(["Address", "City"]).eq("Oslo");
        assert!(matches!(
            translate_predicate(&expr, Dialect::Embedded),
            Err(Error::UnsupportedExpression(_))
        ));
    }

    #[test]
    fn evaluation_failures_surface_by_default() {
        let result = translate_predicate(&col("Age").gt(broken()), Dialect::Embedded);
        assert!(matches!(
            result,
            Err(Error::Evaluation {
                source: EvaluationError::Captured(_),
                ..
            })
        ));
        let result = translate_predicate(&col("Age").gt(lit(1) / 0), Dialect::Embedded);
        assert!(matches!(
            result,
            Err(Error::Evaluation {
                source: EvaluationError::DivisionByZero,
                ..
            })
        ));
    }

    #[test]
    fn evaluation_failures_can_fall_back() {
        let sql =
            translate_predicate_with(&col("Age").gt(broken()), Dialect::Embedded, &fallback())
                .unwrap();
        assert_eq!(sql.sql, "Age > @p0");
        assert_eq!(sql.params.get("p0"), Some(&Value::Null));

        // a failed value never turns into a NULL test
        for (expr, rendered) in [
            (col("Id").eq(broken()), "Id = @p0"),
            (col("Id").ne(broken()), "Id <> @p0"),
            (broken().ne(col("Id")), "@p0 <> Id"),
        ] {
            let sql = translate_predicate_with(&expr, Dialect::Embedded, &fallback()).unwrap();
            assert_eq!(sql.sql, rendered);
            assert_eq!(sql.params.get("p0"), Some(&Value::Null));
        }

        // a NULL given by the caller still is one
        let sql = translate_predicate_with(
            &col("Id").ne(captured("missing", Value::Null)).and(col("Age").gt(broken())),
            Dialect::Embedded,
            &fallback(),
        )
        .unwrap();
        assert_eq!(sql.sql, "Id IS NOT NULL AND Age > @p0");

        // arithmetic has no plain SQL rendering
        let result =
            translate_predicate_with(&col("Age").gt(lit(1) / 0), Dialect::Embedded, &fallback());
        assert!(matches!(result, Err(Error::UnsupportedExpression(_))));
    }
}

mod assignments {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn assignments_are_parameterized() {
        let assignments = Assignments::new()
            .set("Name", "bob")
            .set("Age", lit(30) + 1);
        let sql = translate_assignments(&assignments, Dialect::ClientServer).unwrap();
        insta::assert_snapshot!(common::render(&sql), @r###"
        `Name` = @set0, `Age` = @set1

        {"set0": Text("bob"), "set1": Int(31)}
        "###);
    }

    #[test]
    fn datetimes_are_formatted_for_client_server() {
        let joined = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|date| date.and_hms_opt(7, 5, 1))
            .unwrap();
        let assignments = Assignments::new().set("Joined", captured("joined", joined));

        let sql = translate_assignments(&assignments, Dialect::ClientServer).unwrap();
        assert_eq!(
            sql.params.get("set0"),
            Some(&Value::from("2024-03-09 07:05:01"))
        );

        let sql = translate_assignments(&assignments, Dialect::Embedded).unwrap();
        assert_eq!(sql.params.get("set0"), Some(&Value::DateTime(joined)));
    }

    #[test]
    fn failed_evaluation_assigns_null_only_when_falling_back() {
        let assignments = Assignments::new().set("Name", broken());
        assert!(matches!(
            translate_assignments(&assignments, Dialect::Embedded),
            Err(Error::Evaluation { .. })
        ));

        let set_list = query_engine_translation::translation::query::assignment::translate_set_list(
            &assignments,
            Dialect::Embedded,
            &fallback(),
        )
        .unwrap();
        assert_eq!(set_list.0[0].1, Value::Null);
    }

    #[test]
    fn invalid_assignments_are_rejected() {
        assert!(matches!(
            translate_assignments(&Assignments::new(), Dialect::Embedded),
            Err(Error::EmptyAssignments)
        ));
        assert!(matches!(
            translate_assignments(
                &Assignments::new().set("Age", col("Age") + 1),
                Dialect::Embedded
            ),
            Err(Error::UnsupportedExpression(_))
        ));
    }
}

mod builder {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn count_omits_ordering_and_paging() {
        let mut builder = QueryBuilder::new("users", Dialect::Embedded);
        builder
            .where_(&col("Age").ge(30))
            .unwrap()
            .order_by(&col("Name"))
            .unwrap()
            .limit(10, Some(5));

        let select = builder.to_select_statement();
        assert_eq!(
            select.sql,
            "SELECT * FROM users WHERE Age >= @p0 ORDER BY Name ASC LIMIT 10 OFFSET 5"
        );

        let count = builder.to_count_statement();
        assert_eq!(count.sql, "SELECT COUNT(*) FROM users WHERE Age >= @p0");
        assert!(!count.sql.contains("ORDER BY"));
        assert!(!count.sql.contains("LIMIT"));
        assert!(!count.sql.contains("OFFSET"));
        assert_eq!(count.params, select.params);
    }

    #[test]
    fn or_chains_left_to_right() {
        let mut builder = QueryBuilder::new("users", Dialect::ClientServer);
        builder
            .where_(&col("Age").gt(60))
            .unwrap()
            .and(&col("Name").starts_with("a"))
            .unwrap()
            .or(&col("Age").lt(18))
            .unwrap();

        let sql = builder.to_select_statement();
        insta::assert_snapshot!(
            sql.sql,
            @"SELECT * FROM `users` WHERE `Age` > @p0 AND `Name` LIKE CONCAT(@p1, '%') OR `Age` < @p2"
        );
        assert_eq!(
            sql.params.keys().cloned().collect::<Vec<_>>(),
            vec!["p0", "p1", "p2"]
        );
    }

    #[test]
    fn or_on_an_empty_builder_starts_the_condition() {
        let mut builder = QueryBuilder::new("users", Dialect::Embedded);
        builder.or(&col("Age").lt(18)).unwrap();
        assert_eq!(
            builder.to_select_statement().sql,
            "SELECT * FROM users WHERE Age < @p0"
        );
    }

    #[test]
    fn raw_fragments_keep_their_parameters() {
        let mut builder = QueryBuilder::new("users", Dialect::Embedded);
        builder
            .where_(&col("Age").ge(30))
            .unwrap()
            .or_raw(
                "Name = @name",
                Params::from([("name".to_string(), Value::from("root"))]),
            )
            .unwrap()
            .and(&col("Email").ends_with("@x.com"))
            .unwrap();

        let sql = builder.to_select_statement();
        assert_eq!(
            sql.sql,
            "SELECT * FROM users WHERE Age >= @p0 OR Name = @name AND Email LIKE '%' || @p1"
        );
        assert_eq!(
            sql.params.keys().cloned().collect::<Vec<_>>(),
            vec!["p0", "name", "p1"]
        );
    }

    #[test]
    fn orderings_accumulate_and_unwrap_conversions() {
        let mut builder = QueryBuilder::new("users", Dialect::Embedded);
        builder
            .order_by(&col("Age").convert())
            .unwrap()
            .order_by_descending(&col("Id"))
            .unwrap();
        assert_eq!(
            builder.to_select_statement().sql,
            "SELECT * FROM users ORDER BY Age ASC, Id DESC"
        );
    }

    #[test]
    fn the_last_limit_wins() {
        let mut builder = QueryBuilder::new("users", Dialect::Embedded);
        builder.limit(10, Some(5)).limit(3, None);
        assert_eq!(
            builder.to_select_statement().sql,
            "SELECT * FROM users LIMIT 3"
        );
    }
}

mod statements_for_entities {
    use super::*;
    use similar_asserts::assert_eq;

    fn context(dialect: Dialect) -> StatementContext {
        StatementContext::new(dialect, TranslationOptions::default())
    }

    fn ann() -> ColumnValues {
        ColumnValues::from([
            ("Id".to_string(), Value::Int(7)),
            ("Name".to_string(), Value::from("ann")),
            ("Age".to_string(), Value::Int(20)),
            ("Email".to_string(), Value::Null),
        ])
    }

    #[test]
    fn insert_skips_generated_and_ignored_columns() {
        let sql = statements::insert(&context(Dialect::Embedded), &common::users(), &[ann()], true);
        insta::assert_snapshot!(common::render(&sql), @r###"
        INSERT INTO users (Name, Age, Email) VALUES (@p0, @p1, @p2); SELECT last_insert_rowid()

        {"p0": Text("ann"), "p1": Int(20), "p2": Null}
        "###);
    }

    #[test]
    fn insert_many_rows_in_one_statement() {
        let sql = statements::insert(
            &context(Dialect::ClientServer),
            &common::users(),
            &[ann(), ann()],
            false,
        );
        assert_eq!(
            sql.sql,
            "INSERT INTO `users` (`Name`, `Age`, `Email`) VALUES (@p0, @p1, @p2), (@p3, @p4, @p5)"
        );
    }

    #[test]
    fn update_is_keyed_on_the_key_column() {
        let sql = statements::update(&context(Dialect::Embedded), &common::users(), &ann()).unwrap();
        assert_eq!(
            sql.sql,
            "UPDATE users SET Name = @set0, Age = @set1, Email = @set2 WHERE Id = @p0"
        );
        assert_eq!(sql.params.get("p0"), Some(&Value::Int(7)));
    }

    #[test]
    fn update_where_combines_assignments_and_predicate() {
        let sql = statements::update_where(
            &context(Dialect::Embedded),
            &common::users(),
            &Assignments::new().set("Name", "retired"),
            &col("Age").ge(65),
        )
        .unwrap();
        assert_eq!(sql.sql, "UPDATE users SET Name = @set0 WHERE Age >= @p0");
    }

    #[test]
    fn deletes() {
        let context = context(Dialect::Embedded);
        assert_eq!(
            statements::delete_by_key(&context, &common::users(), Value::Int(7))
                .unwrap()
                .sql,
            "DELETE FROM users WHERE Id = @p0"
        );
        assert_eq!(
            statements::delete_by_keys(&context, &common::users(), vec![Value::Int(1), Value::Int(2)])
                .unwrap()
                .sql,
            "DELETE FROM users WHERE Id IN (@p0, @p1)"
        );
        assert_eq!(
            statements::delete_where(&context, &common::users(), &col("Age").lt(18))
                .unwrap()
                .sql,
            "DELETE FROM users WHERE Age < @p0"
        );
    }

    #[test]
    fn key_operations_need_a_key() {
        let context = context(Dialect::Embedded);
        let result = statements::select_by_key(&context, &common::audit_log(), Value::Int(1));
        assert!(matches!(result, Err(Error::MissingKeyDescriptor(table)) if table == "audit_log"));
        let result = statements::delete_by_keys(&context, &common::audit_log(), vec![]);
        assert!(matches!(result, Err(Error::MissingKeyDescriptor(_))));
    }

    #[test]
    fn selects_and_counts() {
        let context = context(Dialect::Embedded);
        assert_eq!(
            statements::select_where(&context, &common::users(), &col("Age").ge(30), Some(1))
                .unwrap()
                .sql,
            "SELECT * FROM users WHERE Age >= @p0 LIMIT 1"
        );
        assert_eq!(
            statements::count(&context, &common::users(), None).unwrap().sql,
            "SELECT COUNT(*) FROM users"
        );
    }

    #[test]
    fn create_table_per_dialect() {
        insta::assert_snapshot!(
            statements::create_table(&common::users(), Dialect::Embedded).0.sql,
            @"CREATE TABLE users (Id INTEGER PRIMARY KEY AUTOINCREMENT, Name TEXT NOT NULL, Age INTEGER NOT NULL, Email TEXT)"
        );
        insta::assert_snapshot!(
            statements::create_table(&common::users(), Dialect::ClientServer).0.sql,
            @"CREATE TABLE `users` (`Id` BIGINT NOT NULL AUTO_INCREMENT, `Name` VARCHAR(100) NOT NULL, `Age` INT NOT NULL, `Email` VARCHAR(255), PRIMARY KEY (`Id`))"
        );
        assert_eq!(
            statements::create_table(&common::audit_log(), Dialect::Embedded).0.sql,
            "CREATE TABLE audit_log (Line TEXT NOT NULL)"
        );
    }

    #[test]
    fn create_indexes_per_dialect() {
        let embedded = statements::create_indexes(&common::users(), Dialect::Embedded);
        assert_eq!(
            embedded.iter().map(|ddl| ddl.0.sql.as_str()).collect::<Vec<_>>(),
            vec!["CREATE UNIQUE INDEX IF NOT EXISTS ix_users_email ON users (Email)"]
        );
        let client_server = statements::create_indexes(&common::users(), Dialect::ClientServer);
        assert_eq!(
            client_server[0].0.sql,
            "CREATE UNIQUE INDEX `ix_users_email` ON `users` (`Email`)"
        );
    }
}
