use crate::{
    error::PlanError,
    metadata::MetadataFacade,
    plan::{
        FetchSegment, FieldEntry, FunctionTarget, JoinSpec, PlannedFunction, ProjectedField,
        QueryPlan,
    },
};
use connectors::{
    capabilities::FunctionSupport, ConnectorRegistry, DataSourceSpec, FetchAttribute,
};
use sql_syntax::ast::{
    clause::Operand,
    field::{FieldExpr, FuncParam},
    JoinSegment, KeyRef, Query, SelectSegment,
};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Validates an AST against the metadata and partitions its work between
/// source-side pushdown and platform evaluation.
pub struct Planner<'a> {
    metadata: &'a dyn MetadataFacade,
    registry: &'a ConnectorRegistry,
}

impl<'a> Planner<'a> {
    pub fn new(metadata: &'a dyn MetadataFacade, registry: &'a ConnectorRegistry) -> Self {
        Planner { metadata, registry }
    }

    pub fn plan(&self, query: &Query) -> Result<QueryPlan, PlanError> {
        let select = pre_validate(query).map_err(|e| e.at_stage("pre-validate"))?;

        let mut builder = PlanBuilder::new(select);
        builder
            .extract_select_fields()
            .map_err(|e| e.at_stage("extract-select-fields"))?;
        builder
            .extract_segment_fields(query)
            .map_err(|e| e.at_stage("extract-segment-fields"))?;
        self.validate_sources(&mut builder)
            .map_err(|e| e.at_stage("validate-sources"))?;
        self.classify_functions(&mut builder)
            .map_err(|e| e.at_stage("classify-functions"))?;
        validate_group_by(&builder, query).map_err(|e| e.at_stage("validate-group-by"))?;
        builder
            .extract_function_param_fields()
            .map_err(|e| e.at_stage("extract-function-param-fields"))?;
        let segments = builder
            .prepare_segments(query)
            .map_err(|e| e.at_stage("prepare-segments"))?;

        debug!(
            segments = segments.len(),
            fields = builder.fields.len(),
            functions = builder.functions.len(),
            "query planned"
        );

        Ok(QueryPlan {
            fields: builder.fields,
            functions: builder.functions,
            segments,
            where_clause: query.where_clause().map(|w| w.clause.clone()),
            group_by: query.group_by().map(|g| g.key.clone()),
            order_by: query.order_by().map(|o| (o.key.clone(), o.dir)),
            limit: query.limit(),
        })
    }

    fn validate_sources(&self, builder: &mut PlanBuilder<'_>) -> Result<(), PlanError> {
        let mut missing: BTreeSet<String> = BTreeSet::new();
        for (alias, data_source, _) in &builder.resources {
            match self.metadata.data_source(data_source) {
                Some(spec) => {
                    builder.bindings.insert(alias.clone(), spec);
                }
                None => {
                    missing.insert(data_source.clone());
                }
            }
        }
        if !missing.is_empty() {
            let names: Vec<String> = missing.into_iter().collect();
            return Err(PlanError::UnknownDataSources(names.join(", ")));
        }
        Ok(())
    }

    fn classify_functions(&self, builder: &mut PlanBuilder<'_>) -> Result<(), PlanError> {
        let alias_map = builder.alias_map.clone();
        let bindings = builder.bindings.clone();
        for function in &mut builder.functions {
            if function.is_aggregate() {
                continue;
            }

            let mut sources: BTreeSet<String> = BTreeSet::new();
            let mut forced_platform = false;
            for param in &function.call.params {
                match param {
                    FuncParam::Field { src, .. } => {
                        sources.insert(src.clone());
                    }
                    FuncParam::Star { src: Some(src) } => {
                        sources.insert(src.clone());
                    }
                    // A bare star spans every source.
                    FuncParam::Star { src: None } => forced_platform = true,
                    FuncParam::AliasRef { alias } => {
                        let (src, _) = alias_map
                            .get(alias)
                            .ok_or_else(|| PlanError::UnknownAlias(alias.clone()))?;
                        sources.insert(src.clone());
                    }
                    FuncParam::QuotedString { .. } | FuncParam::Atom(_) => {}
                }
            }

            if forced_platform || sources.len() != 1 {
                continue;
            }

            let Some(source) = sources.into_iter().next() else {
                continue;
            };
            let spec = bindings
                .get(&source)
                .ok_or_else(|| PlanError::UnknownAlias(source.clone()))?;
            let module = self
                .registry
                .function_module_for(spec)
                .map_err(|e| PlanError::Connector(e.to_string()))?;

            if let FunctionSupport::Pushdown { rendered } = module.supports(&function.call) {
                function.target = FunctionTarget::Pushdown { source, rendered };
            }
        }
        Ok(())
    }
}

fn pre_validate(query: &Query) -> Result<&SelectSegment, PlanError> {
    let select = match query.segments.first() {
        Some(sql_syntax::ast::Segment::Select(select)) => select,
        _ => return Err(PlanError::MissingSelect),
    };
    if query.joins().len() > 1 {
        return Err(PlanError::MultipleJoins);
    }
    Ok(select)
}

struct PlanBuilder<'q> {
    select: &'q SelectSegment,
    fields: Vec<FieldEntry>,
    functions: Vec<PlannedFunction>,
    /// user alias -> (src, field), from the SELECT list.
    alias_map: HashMap<String, (String, String)>,
    /// (alias, data_source, src), SELECT resource first.
    resources: Vec<(String, String, String)>,
    bindings: HashMap<String, DataSourceSpec>,
    next_index: usize,
}

impl<'q> PlanBuilder<'q> {
    fn new(select: &'q SelectSegment) -> Self {
        PlanBuilder {
            select,
            fields: Vec::new(),
            functions: Vec::new(),
            alias_map: HashMap::new(),
            resources: Vec::new(),
            bindings: HashMap::new(),
            next_index: 0,
        }
    }

    fn extract_select_fields(&mut self) -> Result<(), PlanError> {
        let select = self.select;
        let resource = select.resource.clone();
        self.add_resource(&resource)?;

        for (index, field) in select.fields.iter().enumerate() {
            match field {
                FieldExpr::Star { src } => self.fields.push(FieldEntry {
                    field: ProjectedField::Star { src: src.clone() },
                    index,
                    drop: false,
                }),
                FieldExpr::Field { src, field, alias } => {
                    if let Some(alias) = alias {
                        self.alias_map
                            .insert(alias.clone(), (src.clone(), field.clone()));
                    }
                    self.fields.push(FieldEntry {
                        field: ProjectedField::Field {
                            src: src.clone(),
                            field: field.clone(),
                            alias: alias.clone(),
                        },
                        index,
                        drop: false,
                    });
                }
                FieldExpr::FuncCall(call) => self.functions.push(PlannedFunction {
                    call: call.clone(),
                    index,
                    target: FunctionTarget::Platform,
                }),
            }
        }
        self.next_index = self.select.fields.len();
        Ok(())
    }

    fn extract_segment_fields(&mut self, query: &Query) -> Result<(), PlanError> {
        for join in query.joins() {
            self.add_resource(&join.resource)?;
            for operand in [&join.clause.p1, &join.clause.p2] {
                self.ensure_operand_fetched(operand)?;
            }
        }

        if let Some(where_clause) = query.where_clause() {
            for operand in [&where_clause.clause.p1, &where_clause.clause.p2] {
                self.ensure_operand_fetched(operand)?;
            }
        }

        if let Some(group) = query.group_by() {
            self.ensure_key_fetched(&group.key)?;
        }

        if let Some(order) = query.order_by() {
            self.ensure_key_fetched(&order.key)?;
        }

        Ok(())
    }

    fn extract_function_param_fields(&mut self) -> Result<(), PlanError> {
        let params: Vec<FuncParam> = self
            .functions
            .iter()
            .filter(|f| f.is_platform())
            .flat_map(|f| f.call.params.iter().cloned())
            .collect();

        for param in params {
            match param {
                FuncParam::Field { src, field } => self.ensure_fetched(&src, &field)?,
                FuncParam::Star { src: Some(src) } => self.ensure_star_fetched(&src)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn prepare_segments(&self, query: &Query) -> Result<Vec<FetchSegment>, PlanError> {
        let joins: HashMap<&str, &JoinSegment> = query
            .joins()
            .into_iter()
            .map(|j| (j.resource.alias.as_str(), j))
            .collect();

        let mut segments = Vec::with_capacity(self.resources.len());
        for (alias, _, src) in &self.resources {
            let spec = self
                .bindings
                .get(alias)
                .ok_or_else(|| PlanError::UnknownAlias(alias.clone()))?;

            let mut attributes: Vec<FetchAttribute> = Vec::new();
            for entry in &self.fields {
                match &entry.field {
                    ProjectedField::Star { src } if src == alias => {
                        attributes.push(FetchAttribute::Star);
                    }
                    ProjectedField::Field {
                        src,
                        field,
                        alias: user_alias,
                    } if src == alias => {
                        attributes.push(FetchAttribute::Field {
                            name: field.clone(),
                            alias: user_alias.clone(),
                            drop: entry.drop,
                        });
                    }
                    _ => {}
                }
            }
            for function in &self.functions {
                if let FunctionTarget::Pushdown { source, rendered } = &function.target {
                    if source == alias {
                        attributes.push(FetchAttribute::Rendered {
                            sql: rendered.clone(),
                            ident: function.call.ident.clone(),
                            function: function.call.name.as_str().to_string(),
                            alias: function.call.alias.clone(),
                        });
                    }
                }
            }

            let merge = joins.get(alias.as_str()).map(|join| JoinSpec {
                join_type: join.join_type,
                clause: join.clause.clone(),
            });

            segments.push(FetchSegment {
                alias: alias.clone(),
                src: src.clone(),
                spec: spec.clone(),
                attributes,
                merge,
            });
        }
        Ok(segments)
    }

    fn add_resource(&mut self, resource: &sql_syntax::ast::resource::Resource) -> Result<(), PlanError> {
        if self.resources.iter().any(|(a, _, _)| a == &resource.alias) {
            return Err(PlanError::DuplicateAlias(resource.alias.clone()));
        }
        self.resources.push((
            resource.alias.clone(),
            resource.data_source.clone(),
            resource.src.clone(),
        ));
        Ok(())
    }

    fn known_alias(&self, alias: &str) -> bool {
        self.resources.iter().any(|(a, _, _)| a == alias)
    }

    fn ensure_operand_fetched(&mut self, operand: &Operand) -> Result<(), PlanError> {
        if let Operand::Field { src, field } = operand {
            self.ensure_fetched(src, field)?;
        }
        Ok(())
    }

    fn ensure_key_fetched(&mut self, key: &KeyRef) -> Result<(), PlanError> {
        match key {
            KeyRef::Field { src, field } => self.ensure_fetched(src, field),
            KeyRef::Alias(alias) => {
                let in_alias_map = self.alias_map.contains_key(alias);
                let is_function = self.functions.iter().any(|f| {
                    f.call.ident == *alias || f.call.alias.as_deref() == Some(alias.as_str())
                });
                if !in_alias_map && !is_function {
                    return Err(PlanError::UnknownAlias(alias.clone()));
                }
                Ok(())
            }
        }
    }

    /// Append `(src, field)` to the fetch plan as a dropped attribute when
    /// no projection entry already covers it.
    fn ensure_fetched(&mut self, src: &str, field: &str) -> Result<(), PlanError> {
        if !self.known_alias(src) {
            return Err(PlanError::UnknownAlias(src.to_string()));
        }
        if self.fields.iter().any(|entry| entry.covers(src, field)) {
            return Ok(());
        }
        self.fields.push(FieldEntry {
            field: ProjectedField::Field {
                src: src.to_string(),
                field: field.to_string(),
                alias: None,
            },
            index: self.next_index,
            drop: true,
        });
        self.next_index += 1;
        Ok(())
    }

    fn ensure_star_fetched(&mut self, src: &str) -> Result<(), PlanError> {
        if !self.known_alias(src) {
            return Err(PlanError::UnknownAlias(src.to_string()));
        }
        let covered = self
            .fields
            .iter()
            .any(|e| matches!(&e.field, ProjectedField::Star { src: s } if s == src));
        if !covered {
            self.fields.push(FieldEntry {
                field: ProjectedField::Star {
                    src: src.to_string(),
                },
                index: self.next_index,
                drop: true,
            });
            self.next_index += 1;
        }
        Ok(())
    }
}

fn validate_group_by(builder: &PlanBuilder<'_>, query: &Query) -> Result<(), PlanError> {
    let aggregates: Vec<&PlannedFunction> = builder
        .functions
        .iter()
        .filter(|f| f.is_aggregate())
        .collect();
    let plain: Vec<&FieldEntry> = builder.fields.iter().filter(|f| !f.drop).collect();

    let Some(group) = query.group_by() else {
        if aggregates.is_empty() {
            return Ok(());
        }
        for entry in &plain {
            if !consumed_by_aggregate(entry, &aggregates, &builder.alias_map) {
                return Err(PlanError::AggregateWithoutGroupBy);
            }
        }
        return Ok(());
    };

    // Resolve the group key to a (src, field) when it names a plain
    // attribute; alias keys naming a function output resolve to none.
    let key_field: Option<(String, String)> = match &group.key {
        KeyRef::Field { src, field } => Some((src.clone(), field.clone())),
        KeyRef::Alias(alias) => {
            let mapped = builder.alias_map.get(alias).cloned();
            if mapped.is_none() {
                let is_function = builder.functions.iter().any(|f| {
                    f.call.ident == *alias || f.call.alias.as_deref() == Some(alias.as_str())
                });
                if !is_function {
                    return Err(PlanError::UnknownGroupKey(alias.clone()));
                }
            }
            mapped
        }
    };

    for entry in &plain {
        let is_key = match (&entry.field, &key_field) {
            (ProjectedField::Field { src, field, .. }, Some((ks, kf))) => {
                src == ks && field == kf
            }
            _ => false,
        };
        if is_key || consumed_by_aggregate(entry, &aggregates, &builder.alias_map) {
            continue;
        }
        let name = match &entry.field {
            ProjectedField::Field { src, field, .. } => format!("{src}.{field}"),
            ProjectedField::Star { src } => format!("{src}.*"),
        };
        return Err(PlanError::FieldOutsideAggregate(name));
    }
    Ok(())
}

fn consumed_by_aggregate(
    entry: &FieldEntry,
    aggregates: &[&PlannedFunction],
    alias_map: &HashMap<String, (String, String)>,
) -> bool {
    let field_matches = |src: &str, field: &str| {
        matches!(
            &entry.field,
            ProjectedField::Field { src: s, field: f, .. } if s == src && f == field
        )
    };
    aggregates.iter().any(|agg| {
        agg.call.params.iter().any(|param| match param {
            FuncParam::Field { src, field } => field_matches(src, field),
            FuncParam::Star { src: Some(src) } => match &entry.field {
                ProjectedField::Star { src: s } => s == src,
                ProjectedField::Field { src: s, .. } => s == src,
            },
            FuncParam::Star { src: None } => true,
            FuncParam::AliasRef { alias } => alias_map
                .get(alias)
                .map(|(src, field)| field_matches(src, field))
                .unwrap_or(false),
            FuncParam::QuotedString { .. } | FuncParam::Atom(_) => false,
        })
    })
}
