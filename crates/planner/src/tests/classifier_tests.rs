use crate::{
    error::PlanError,
    metadata::InMemoryMetadata,
    plan::{FunctionTarget, ProjectedField},
    Planner,
};
use connectors::{
    kerberos::KerberosConfig, ConnectorClass, ConnectorEntry, ConnectorRegistry, DataSourceSpec,
    FetchAttribute,
};
use sql_syntax::parse;

fn registry() -> ConnectorRegistry {
    ConnectorRegistry::new(
        vec![
            ConnectorEntry {
                class: ConnectorClass::File,
                source_type: "CSV".into(),
                version: None,
                constants: serde_json::Value::Null,
            },
            ConnectorEntry {
                class: ConnectorClass::File,
                source_type: "JSON".into(),
                version: None,
                constants: serde_json::Value::Null,
            },
            ConnectorEntry {
                class: ConnectorClass::Relational,
                source_type: "PostgreSQL".into(),
                version: None,
                constants: serde_json::json!({
                    "connection_template": "Driver=$driver;UID=$uid",
                    "driver": "{PostgreSQL Unicode}",
                }),
            },
        ],
        KerberosConfig::default(),
    )
}

fn metadata() -> InMemoryMetadata {
    InMemoryMetadata::new()
        .with_data_source(
            DataSourceSpec::new("csv", "CSV", None)
                .with_properties(serde_json::json!({"base_dir": "/data"})),
        )
        .with_data_source(
            DataSourceSpec::new("json", "JSON", None)
                .with_properties(serde_json::json!({"base_dir": "/data"})),
        )
        .with_data_source(DataSourceSpec::new("pg", "PostgreSQL", None))
}

fn plan(sql: &str) -> Result<crate::QueryPlan, PlanError> {
    let query = parse(sql).expect("query parses");
    let meta = metadata();
    let registry = registry();
    Planner::new(&meta, &registry).plan(&query)
}

#[test]
fn unknown_data_source_reports_exact_message() {
    let err = plan("SELECT a.* FROM absent.t a").unwrap_err();
    assert_eq!(
        err.root().to_string(),
        "Data source(s) do not exist: absent"
    );
}

#[test]
fn multiple_missing_sources_are_sorted_and_joined() {
    let err =
        plan("SELECT a.x FROM zeta.t a LEFT JOIN alpha.u b ON (a.x = b.y)").unwrap_err();
    assert_eq!(
        err.root().to_string(),
        "Data source(s) do not exist: alpha, zeta"
    );
}

#[test]
fn join_and_order_attributes_are_fetched_dropped() {
    let p = plan(
        "SELECT csv.name AS name,json.category AS category \
         FROM csv.'one.csv' csv \
         LEFT JOIN json.'two.json' json ON (csv.id = json.id) \
         ORDER BY csv.id ASC",
    )
    .unwrap();

    // csv.id appears once, flagged dropped; json.id likewise.
    let dropped: Vec<_> = p.fields.iter().filter(|f| f.drop).collect();
    assert_eq!(dropped.len(), 2);
    assert!(dropped
        .iter()
        .any(|f| f.field == ProjectedField::Field { src: "csv".into(), field: "id".into(), alias: None }));

    let csv_segment = &p.segments[0];
    assert_eq!(csv_segment.alias, "csv");
    assert!(csv_segment.merge.is_none());
    assert_eq!(
        csv_segment.attributes,
        vec![
            FetchAttribute::Field {
                name: "name".into(),
                alias: Some("name".into()),
                drop: false,
            },
            FetchAttribute::Field {
                name: "id".into(),
                alias: None,
                drop: true,
            },
        ]
    );

    let json_segment = &p.segments[1];
    assert!(json_segment.merge.is_some());
}

#[test]
fn where_attribute_covered_by_star_is_not_duplicated() {
    let p = plan("SELECT s.* FROM csv.t s WHERE s.n = 3").unwrap();
    assert_eq!(p.fields.len(), 1);
    assert!(matches!(
        p.fields[0].field,
        ProjectedField::Star { ref src } if src == "s"
    ));
    assert_eq!(p.segments[0].attributes, vec![FetchAttribute::Star]);
}

#[test]
fn aggregates_are_always_platform() {
    let p = plan("SELECT COUNT(s.v) AS c FROM pg.t s").unwrap();
    assert_eq!(p.functions[0].target, FunctionTarget::Platform);
    assert!(p.has_aggregates());
}

#[test]
fn scalar_on_relational_source_is_pushed_down() {
    let p = plan("SELECT LOWER(s.name) FROM pg.t s").unwrap();
    assert_eq!(
        p.functions[0].target,
        FunctionTarget::Pushdown {
            source: "s".into(),
            rendered: "LOWER(s.name)".into(),
        }
    );
    // The rendered call rides in the fetch list, selected under its ident.
    assert!(p.segments[0].attributes.iter().any(|a| matches!(
        a,
        FetchAttribute::Rendered { ident, .. } if ident == "lower_0"
    )));
}

#[test]
fn scalar_on_file_source_stays_on_platform() {
    let p = plan("SELECT LOWER(s.name) FROM csv.t s").unwrap();
    assert_eq!(p.functions[0].target, FunctionTarget::Platform);
    // Its parameter is fetched as a dropped attribute.
    assert!(p.fields.iter().any(|f| f.drop
        && f.field
            == ProjectedField::Field {
                src: "s".into(),
                field: "name".into(),
                alias: None,
            }));
}

#[test]
fn varargs_never_push_down() {
    let p = plan("SELECT CONCAT(s.a,s.b) FROM pg.t s").unwrap();
    assert_eq!(p.functions[0].target, FunctionTarget::Platform);
}

#[test]
fn aggregate_without_group_by_requires_all_fields_consumed() {
    let err = plan("SELECT s.u,COUNT(s.v) AS c FROM csv.t s").unwrap_err();
    assert_eq!(
        err.root().to_string(),
        "aggregate without GROUP BY requires all fields in a function"
    );
}

#[test]
fn aggregate_without_group_by_passes_when_fields_are_consumed() {
    assert!(plan("SELECT COUNT(s.v) AS c FROM csv.t s").is_ok());
    assert!(plan("SELECT s.v,COUNT(s.v) AS c FROM csv.t s").is_err());
    assert!(plan("SELECT COUNT(DISTINCT s.v) AS c FROM csv.t s").is_ok());
}

#[test]
fn group_by_key_must_cover_remaining_fields() {
    assert!(plan("SELECT s.u,COUNT(s.msg) AS c FROM csv.t s GROUP BY s.u").is_ok());
    let err = plan("SELECT s.u,s.extra,COUNT(s.msg) AS c FROM csv.t s GROUP BY s.u").unwrap_err();
    assert!(matches!(
        err.root(),
        PlanError::FieldOutsideAggregate(name) if name == "s.extra"
    ));
}

#[test]
fn group_by_alias_resolves_through_select_aliases() {
    assert!(plan("SELECT s.u AS grp,COUNT(s.msg) AS c FROM csv.t s GROUP BY grp").is_ok());
    let err = plan("SELECT s.u AS grp,COUNT(s.msg) AS c FROM csv.t s GROUP BY missing").unwrap_err();
    assert!(matches!(err.root(), PlanError::UnknownAlias(_)));
}

#[test]
fn second_join_is_rejected() {
    let err = plan(
        "SELECT a.x FROM csv.t a \
         LEFT JOIN csv.u b ON (a.x = b.x) \
         LEFT JOIN csv.v c ON (a.x = c.x)",
    )
    .unwrap_err();
    assert!(matches!(err.root(), PlanError::MultipleJoins));
}

#[test]
fn duplicate_resource_alias_is_rejected() {
    let err = plan("SELECT a.x FROM csv.t a LEFT JOIN csv.u a ON (a.x = a.y)").unwrap_err();
    assert!(matches!(err.root(), PlanError::DuplicateAlias(_)));
}

#[test]
fn clause_referencing_unknown_alias_is_rejected() {
    let err = plan("SELECT a.x FROM csv.t a WHERE b.y = 1").unwrap_err();
    assert!(matches!(err.root(), PlanError::UnknownAlias(alias) if alias == "b"));
}

#[test]
fn every_consulted_attribute_lands_in_exactly_one_fetch_list() {
    let p = plan(
        "SELECT csv.name FROM csv.'one.csv' csv \
         LEFT JOIN json.'two.json' json ON (csv.id = json.id) \
         WHERE csv.name = 'x' ORDER BY json.category",
    )
    .unwrap();

    let mut all: Vec<(String, String)> = Vec::new();
    for segment in &p.segments {
        for attr in &segment.attributes {
            if let FetchAttribute::Field { name, .. } = attr {
                all.push((segment.alias.clone(), name.clone()));
            }
        }
    }
    all.sort();
    let mut deduped = all.clone();
    deduped.dedup();
    assert_eq!(all, deduped, "attribute fetched twice: {all:?}");

    for (src, field) in [("csv", "name"), ("csv", "id"), ("json", "id"), ("json", "category")] {
        assert!(
            all.contains(&(src.to_string(), field.to_string())),
            "missing {src}.{field}"
        );
    }
}
