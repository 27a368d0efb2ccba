use crate::{
    ast::{
        clause::{BinaryClause, CompareOp, NumberLit, Operand},
        field::{AtomLiteral, FieldExpr, FuncCall, FuncName, FuncParam},
        resource::Resource,
        GroupBySegment, JoinSegment, JoinType, KeyRef, LimitSegment, OrderBySegment, Query,
        Segment, SelectSegment, SortDir, WhereSegment,
    },
    error::ParseError,
};
use pest::{iterators::Pair, Parser};
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "grammar/sql.pest"]
pub struct SqlParser;

/// Parse a query string into its segment list. Total: every input either
/// parses completely or fails with the unconsumed tail.
pub fn parse(input: &str) -> Result<Query, ParseError> {
    let mut pairs =
        SqlParser::parse(Rule::query, input).map_err(|e| pest_error(input, e))?;
    let query = pairs
        .next()
        .ok_or_else(|| ParseError::new(input, 0, "empty parse result"))?;
    build_query(input, query)
}

fn pest_error(input: &str, err: pest::error::Error<Rule>) -> ParseError {
    let position = match err.location {
        pest::error::InputLocation::Pos(p) => p,
        pest::error::InputLocation::Span((start, _)) => start,
    };
    ParseError::new(input, position, err.variant.message().into_owned())
}

fn unexpected(input: &str, pair: &Pair<Rule>) -> ParseError {
    ParseError::new(
        input,
        pair.as_span().start(),
        format!("unexpected {:?}", pair.as_rule()),
    )
}

fn build_query(input: &str, pair: Pair<Rule>) -> Result<Query, ParseError> {
    let mut segments = Vec::new();
    for seg in pair.into_inner() {
        match seg.as_rule() {
            Rule::select => segments.push(Segment::Select(build_select(input, seg)?)),
            Rule::join => segments.push(Segment::Join(build_join(input, seg)?)),
            Rule::where_clause => {
                let clause = first_inner(input, seg, Rule::binary_clause)?;
                segments.push(Segment::Where(WhereSegment {
                    clause: build_binary_clause(input, clause)?,
                }));
            }
            Rule::group_by => {
                let key = first_inner(input, seg, Rule::group_key)?;
                segments.push(Segment::GroupBy(GroupBySegment {
                    key: build_key_ref(input, key)?,
                }));
            }
            Rule::order_by => segments.push(Segment::OrderBy(build_order_by(input, seg)?)),
            Rule::limit_clause => segments.push(Segment::Limit(build_limit(input, seg)?)),
            Rule::EOI => {}
            _ => return Err(unexpected(input, &seg)),
        }
    }
    Ok(Query { segments })
}

fn build_select(input: &str, pair: Pair<Rule>) -> Result<SelectSegment, ParseError> {
    let mut fields = Vec::new();
    let mut resource = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::field_list => {
                for (index, expr) in inner.into_inner().enumerate() {
                    fields.push(build_field_expr(input, expr, index)?);
                }
            }
            Rule::resource => resource = Some(build_resource(input, inner)?),
            _ => return Err(unexpected(input, &inner)),
        }
    }
    let resource =
        resource.ok_or_else(|| ParseError::new(input, 0, "SELECT is missing its resource"))?;
    Ok(SelectSegment { fields, resource })
}

fn build_field_expr(input: &str, pair: Pair<Rule>, index: usize) -> Result<FieldExpr, ParseError> {
    let inner = only_inner(input, pair)?;
    match inner.as_rule() {
        Rule::star => {
            let src = first_inner(input, inner, Rule::ident)?;
            Ok(FieldExpr::Star {
                src: src.as_str().to_string(),
            })
        }
        Rule::field => {
            let mut parts = inner.into_inner();
            let src = expect_rule(input, parts.next(), Rule::ident)?;
            let field = expect_rule(input, parts.next(), Rule::ident)?;
            let alias = parts
                .next()
                .map(|a| build_alias(input, a))
                .transpose()?;
            Ok(FieldExpr::Field {
                src: src.as_str().to_string(),
                field: field.as_str().to_string(),
                alias,
            })
        }
        Rule::func_call => Ok(FieldExpr::FuncCall(build_func_call(input, inner, index)?)),
        _ => Err(unexpected(input, &inner)),
    }
}

fn build_func_call(input: &str, pair: Pair<Rule>, index: usize) -> Result<FuncCall, ParseError> {
    let span_start = pair.as_span().start();
    let mut name = None;
    let mut params = Vec::new();
    let mut alias = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::func_name => {
                name = FuncName::from_keyword(inner.as_str());
                if name.is_none() {
                    return Err(ParseError::new(
                        input,
                        inner.as_span().start(),
                        format!("unknown function {}", inner.as_str()),
                    ));
                }
            }
            Rule::func_params => {
                for param in inner.into_inner() {
                    params.push(build_func_param(input, param)?);
                }
            }
            Rule::field_alias => alias = Some(build_alias(input, inner)?),
            _ => return Err(unexpected(input, &inner)),
        }
    }
    let name =
        name.ok_or_else(|| ParseError::new(input, span_start, "function call without a name"))?;
    let ident = alias
        .clone()
        .unwrap_or_else(|| format!("{}_{}", name.as_str(), index));
    Ok(FuncCall {
        name,
        kind: name.kind(),
        params,
        alias,
        ident,
    })
}

fn build_func_param(input: &str, pair: Pair<Rule>) -> Result<FuncParam, ParseError> {
    let inner = only_inner(input, pair)?;
    match inner.as_rule() {
        Rule::atom_literal => Ok(FuncParam::Atom(AtomLiteral::Distinct)),
        Rule::param_star => {
            let src = inner.into_inner().next().map(|p| p.as_str().to_string());
            Ok(FuncParam::Star { src })
        }
        Rule::param_field => {
            let mut parts = inner.into_inner();
            let src = expect_rule(input, parts.next(), Rule::ident)?;
            let field = expect_rule(input, parts.next(), Rule::ident)?;
            Ok(FuncParam::Field {
                src: src.as_str().to_string(),
                field: field.as_str().to_string(),
            })
        }
        Rule::quoted_string => {
            let raw = inner.as_str().to_string();
            Ok(FuncParam::QuotedString {
                unquoted: unquote(input, inner)?,
                raw,
            })
        }
        Rule::alias_ref => Ok(FuncParam::AliasRef {
            alias: inner.as_str().to_string(),
        }),
        _ => Err(unexpected(input, &inner)),
    }
}

fn build_resource(input: &str, pair: Pair<Rule>) -> Result<Resource, ParseError> {
    let mut parts = pair.into_inner();
    let data_source = expect_rule(input, parts.next(), Rule::ident)?;
    let src_pair = parts
        .next()
        .ok_or_else(|| ParseError::new(input, 0, "resource is missing its src"))?;
    let src = build_resource_src(input, src_pair)?;
    let alias = expect_rule(input, parts.next(), Rule::ident)?;
    Ok(Resource {
        data_source: data_source.as_str().to_string(),
        src,
        alias: alias.as_str().to_string(),
    })
}

fn build_resource_src(input: &str, pair: Pair<Rule>) -> Result<String, ParseError> {
    let inner = only_inner(input, pair)?;
    match inner.as_rule() {
        Rule::ident => Ok(inner.as_str().to_string()),
        Rule::quoted_string => unquote(input, inner),
        _ => Err(unexpected(input, &inner)),
    }
}

fn build_join(input: &str, pair: Pair<Rule>) -> Result<JoinSegment, ParseError> {
    let mut join_type = None;
    let mut resource = None;
    let mut clause = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::join_type => {
                join_type = Some(match inner.as_str() {
                    "LEFT" => JoinType::Left,
                    "RIGHT" => JoinType::Right,
                    _ => JoinType::Inner,
                });
            }
            Rule::resource => resource = Some(build_resource(input, inner)?),
            Rule::binary_clause => clause = Some(build_binary_clause(input, inner)?),
            _ => return Err(unexpected(input, &inner)),
        }
    }
    match (join_type, resource, clause) {
        (Some(join_type), Some(resource), Some(clause)) => Ok(JoinSegment {
            join_type,
            resource,
            clause,
        }),
        _ => Err(ParseError::new(input, 0, "incomplete JOIN segment")),
    }
}

fn build_binary_clause(input: &str, pair: Pair<Rule>) -> Result<BinaryClause, ParseError> {
    let mut parts = pair.into_inner();
    let p1 = build_operand(
        input,
        parts
            .next()
            .ok_or_else(|| ParseError::new(input, 0, "clause is missing its left operand"))?,
    )?;
    let op_pair = parts
        .next()
        .ok_or_else(|| ParseError::new(input, 0, "clause is missing its operator"))?;
    let op = CompareOp::from_token(op_pair.as_str()).ok_or_else(|| {
        ParseError::new(
            input,
            op_pair.as_span().start(),
            format!("unknown operator {}", op_pair.as_str()),
        )
    })?;
    let p2 = build_operand(
        input,
        parts
            .next()
            .ok_or_else(|| ParseError::new(input, 0, "clause is missing its right operand"))?,
    )?;
    Ok(BinaryClause { p1, op, p2 })
}

fn build_operand(input: &str, pair: Pair<Rule>) -> Result<Operand, ParseError> {
    let inner = only_inner(input, pair)?;
    match inner.as_rule() {
        Rule::field_ref => {
            let mut parts = inner.into_inner();
            let src = expect_rule(input, parts.next(), Rule::ident)?;
            let field = expect_rule(input, parts.next(), Rule::ident)?;
            Ok(Operand::Field {
                src: src.as_str().to_string(),
                field: field.as_str().to_string(),
            })
        }
        Rule::quoted_string => Ok(Operand::QuotedString(unquote(input, inner)?)),
        Rule::number => Ok(Operand::Number(build_number(input, inner)?)),
        _ => Err(unexpected(input, &inner)),
    }
}

fn build_number(input: &str, pair: Pair<Rule>) -> Result<NumberLit, ParseError> {
    let text = pair.as_str();
    let position = pair.as_span().start();
    if text.contains('.') {
        text.parse::<f64>()
            .map(NumberLit::Float)
            .map_err(|_| ParseError::new(input, position, format!("invalid number {text}")))
    } else {
        text.parse::<i64>()
            .map(NumberLit::Int)
            .map_err(|_| ParseError::new(input, position, format!("invalid number {text}")))
    }
}

fn build_key_ref(input: &str, pair: Pair<Rule>) -> Result<KeyRef, ParseError> {
    let inner = only_inner(input, pair)?;
    match inner.as_rule() {
        Rule::field_ref => {
            let mut parts = inner.into_inner();
            let src = expect_rule(input, parts.next(), Rule::ident)?;
            let field = expect_rule(input, parts.next(), Rule::ident)?;
            Ok(KeyRef::Field {
                src: src.as_str().to_string(),
                field: field.as_str().to_string(),
            })
        }
        Rule::alias_ref => Ok(KeyRef::Alias(inner.as_str().to_string())),
        _ => Err(unexpected(input, &inner)),
    }
}

fn build_order_by(input: &str, pair: Pair<Rule>) -> Result<OrderBySegment, ParseError> {
    let mut key = None;
    let mut dir = SortDir::Asc;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::order_key => key = Some(build_key_ref(input, inner)?),
            Rule::order_dir => {
                dir = if inner.as_str() == "DESC" {
                    SortDir::Desc
                } else {
                    SortDir::Asc
                };
            }
            _ => return Err(unexpected(input, &inner)),
        }
    }
    let key = key.ok_or_else(|| ParseError::new(input, 0, "ORDER BY is missing its key"))?;
    Ok(OrderBySegment { key, dir })
}

fn build_limit(input: &str, pair: Pair<Rule>) -> Result<LimitSegment, ParseError> {
    let digits = first_inner(input, pair, Rule::pos_int)?;
    let position = digits.as_span().start();
    let n: usize = digits
        .as_str()
        .parse()
        .map_err(|_| ParseError::new(input, position, "invalid LIMIT value"))?;
    if n == 0 {
        return Err(ParseError::new(input, position, "LIMIT must be positive"));
    }
    Ok(LimitSegment { n })
}

fn build_alias(input: &str, pair: Pair<Rule>) -> Result<String, ParseError> {
    let ident = first_inner(input, pair, Rule::ident)?;
    Ok(ident.as_str().to_string())
}

fn unquote(input: &str, pair: Pair<Rule>) -> Result<String, ParseError> {
    let inner = first_inner(input, pair, Rule::quoted_inner)?;
    Ok(inner.as_str().replace("''", "'"))
}

fn only_inner<'a>(input: &str, pair: Pair<'a, Rule>) -> Result<Pair<'a, Rule>, ParseError> {
    let span_start = pair.as_span().start();
    pair.into_inner()
        .next()
        .ok_or_else(|| ParseError::new(input, span_start, "empty grammar node"))
}

fn first_inner<'a>(
    input: &str,
    pair: Pair<'a, Rule>,
    rule: Rule,
) -> Result<Pair<'a, Rule>, ParseError> {
    let span_start = pair.as_span().start();
    pair.into_inner()
        .find(|p| p.as_rule() == rule)
        .ok_or_else(|| ParseError::new(input, span_start, format!("expected {rule:?}")))
}

fn expect_rule<'a>(
    input: &str,
    pair: Option<Pair<'a, Rule>>,
    rule: Rule,
) -> Result<Pair<'a, Rule>, ParseError> {
    match pair {
        Some(p) if p.as_rule() == rule => Ok(p),
        Some(p) => Err(unexpected(input, &p)),
        None => Err(ParseError::new(input, 0, format!("expected {rule:?}"))),
    }
}
