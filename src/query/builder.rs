//! Query translation pipeline.
//!
//! An ordered chain of builders lowers the abstract query plus command
//! options into one concrete [`SearchRequest`]. Each builder consumes the
//! context by value and returns it, appending to the scored and non-scored
//! clause accumulators; the pipeline assembles the final boolean query at
//! the end. Builders that see nothing relevant pass the context through
//! untouched.

use crate::config::PagingConfig;
use crate::error::Result;
use crate::protocol::request::{SearchRequest, WireQuery};
use crate::query::expression::ExpressionParser;
use crate::query::options::CommandOptions;
use crate::query::repository_query::{RepositoryQuery, SoftDeleteMode};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Accumulator threaded through the builder chain
pub struct QueryContext<'a> {
    pub query: &'a RepositoryQuery,
    pub options: &'a CommandOptions,

    /// Request under construction; `query` is filled in by [`finish`]
    pub request: SearchRequest,

    /// Scored clauses (contribute to relevance)
    must: Vec<WireQuery>,

    /// Non-scored clauses (pure inclusion tests)
    filter: Vec<WireQuery>,

    must_not: Vec<WireQuery>,

    /// Side data builders can leave for later stages
    pub data: HashMap<String, Value>,
}

impl<'a> QueryContext<'a> {
    pub fn new(
        query: &'a RepositoryQuery,
        options: &'a CommandOptions,
        indices: Vec<String>,
    ) -> Self {
        Self {
            query,
            options,
            request: SearchRequest::new(indices),
            must: Vec::new(),
            filter: Vec::new(),
            must_not: Vec::new(),
            data: HashMap::new(),
        }
    }

    pub fn add_must(&mut self, clause: WireQuery) {
        self.must.push(clause);
    }

    pub fn add_filter(&mut self, clause: WireQuery) {
        self.filter.push(clause);
    }

    pub fn add_must_not(&mut self, clause: WireQuery) {
        self.must_not.push(clause);
    }

    /// Assemble the accumulated clauses into the request's query
    fn finish(mut self) -> SearchRequest {
        self.request.query = match (
            self.must.len(),
            self.filter.len(),
            self.must_not.len(),
        ) {
            (0, 0, 0) => WireQuery::MatchAll,
            (1, 0, 0) => self.must.pop().unwrap(),
            (0, 1, 0) => {
                // a lone filter still skips scoring
                WireQuery::Bool {
                    must: Vec::new(),
                    should: Vec::new(),
                    filter: self.filter,
                    must_not: Vec::new(),
                }
            }
            _ => WireQuery::Bool {
                must: self.must,
                should: Vec::new(),
                filter: self.filter,
                must_not: self.must_not,
            },
        };
        self.request
    }
}

/// One stage of the translation pipeline
pub trait QueryBuilder: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply<'a>(&self, ctx: QueryContext<'a>) -> Result<QueryContext<'a>>;
}

/// Lowers id inclusion and exclusion lists
struct IdsQueryBuilder;

impl QueryBuilder for IdsQueryBuilder {
    fn name(&self) -> &'static str {
        "ids"
    }

    fn apply<'a>(&self, mut ctx: QueryContext<'a>) -> Result<QueryContext<'a>> {
        let ids = ctx.query.ids();
        if !ids.is_empty() {
            ctx.add_filter(WireQuery::Ids { values: ids });
        }
        let excluded = ctx.query.excluded_ids();
        if !excluded.is_empty() {
            ctx.add_must_not(WireQuery::Ids { values: excluded });
        }
        Ok(ctx)
    }
}

/// Applies the soft-delete visibility mode for types that index a deletion
/// flag. Explicit id fetches bypass the filter so a known document is
/// always retrievable.
struct SoftDeleteQueryBuilder;

impl QueryBuilder for SoftDeleteQueryBuilder {
    fn name(&self) -> &'static str {
        "soft_delete"
    }

    fn apply<'a>(&self, mut ctx: QueryContext<'a>) -> Result<QueryContext<'a>> {
        let Some(field) = ctx.query.soft_delete_field().map(str::to_string) else {
            return Ok(ctx);
        };
        if !ctx.query.ids().is_empty() {
            return Ok(ctx);
        }

        match ctx.query.soft_delete_mode() {
            SoftDeleteMode::ActiveOnly => {
                ctx.add_must_not(WireQuery::Term {
                    field,
                    value: Value::Bool(true),
                });
            }
            SoftDeleteMode::DeletedOnly => {
                ctx.add_filter(WireQuery::Term {
                    field,
                    value: Value::Bool(true),
                });
            }
            SoftDeleteMode::All => {}
        }
        Ok(ctx)
    }
}

/// Parses and lowers the search and filter expressions
struct ExpressionQueryBuilder {
    parser: Arc<dyn ExpressionParser>,
}

impl QueryBuilder for ExpressionQueryBuilder {
    fn name(&self) -> &'static str {
        "expression"
    }

    fn apply<'a>(&self, mut ctx: QueryContext<'a>) -> Result<QueryContext<'a>> {
        let default_field = ctx.query.default_field().map(str::to_string);

        if let Some(expression) = ctx.query.search_expression() {
            let node = self.parser.parse(expression)?;
            let clause = node.to_wire(true, default_field.as_deref())?;
            ctx.add_must(clause);
        }
        if let Some(expression) = ctx.query.filter_expression() {
            let node = self.parser.parse(expression)?;
            let clause = node.to_wire(false, default_field.as_deref())?;
            ctx.add_filter(clause);
        }
        Ok(ctx)
    }
}

/// Copies sort keys onto the request
struct SortQueryBuilder;

impl QueryBuilder for SortQueryBuilder {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn apply<'a>(&self, mut ctx: QueryContext<'a>) -> Result<QueryContext<'a>> {
        ctx.request.sort = ctx.query.sorts();
        Ok(ctx)
    }
}

/// Source field selection and id-only projection
struct FieldSelectionQueryBuilder;

impl QueryBuilder for FieldSelectionQueryBuilder {
    fn name(&self) -> &'static str {
        "field_selection"
    }

    fn apply<'a>(&self, mut ctx: QueryContext<'a>) -> Result<QueryContext<'a>> {
        ctx.request.source_includes = ctx.query.includes();
        ctx.request.source_excludes = ctx.query.excludes();
        ctx.request.ids_only = ctx.query.is_only_ids();
        Ok(ctx)
    }
}

/// Sets from/size and the paging-mode fields.
///
/// Offset and cursor pages ask for one hit past the limit so the caller
/// can observe whether more exist without a second round trip; snapshot
/// pages ask for exactly the limit because the scroll context already
/// knows its own end.
struct PagingQueryBuilder {
    config: PagingConfig,
}

impl PagingQueryBuilder {
    fn effective_limit(&self, options: &CommandOptions) -> usize {
        options
            .limit()
            .unwrap_or(self.config.default_limit)
            .min(self.config.max_limit)
    }
}

impl QueryBuilder for PagingQueryBuilder {
    fn name(&self) -> &'static str {
        "paging"
    }

    fn apply<'a>(&self, mut ctx: QueryContext<'a>) -> Result<QueryContext<'a>> {
        let limit = self.effective_limit(ctx.options);

        if ctx.options.uses_snapshot_paging() {
            ctx.request.size = Some(limit);
            let lifetime = ctx
                .options
                .snapshot_lifetime()
                .unwrap_or_else(|| self.config.snapshot_lifetime());
            ctx.request.scroll_lifetime_secs = Some(lifetime.as_secs());
            return Ok(ctx);
        }

        ctx.request.size = Some(limit + 1);

        if ctx.options.uses_search_after_paging() {
            if let Some(values) = ctx.options.search_after_values() {
                ctx.request.search_after = Some(values);
            }
            return Ok(ctx);
        }

        let page = ctx.options.page();
        if page > 1 {
            ctx.request.from = Some((page as usize - 1) * limit);
        }
        Ok(ctx)
    }
}

/// Copies aggregation expressions onto the request
struct AggregationsQueryBuilder;

impl QueryBuilder for AggregationsQueryBuilder {
    fn name(&self) -> &'static str {
        "aggregations"
    }

    fn apply<'a>(&self, mut ctx: QueryContext<'a>) -> Result<QueryContext<'a>> {
        ctx.request.aggregations = ctx.query.aggregations();
        Ok(ctx)
    }
}

/// The ordered builder chain
pub struct QueryPipeline {
    builders: Vec<Box<dyn QueryBuilder>>,
}

impl QueryPipeline {
    /// Standard chain: ids, soft delete, expressions, sort, field
    /// selection, paging, aggregations
    pub fn standard(parser: Arc<dyn ExpressionParser>, paging: PagingConfig) -> Self {
        Self {
            builders: vec![
                Box::new(IdsQueryBuilder),
                Box::new(SoftDeleteQueryBuilder),
                Box::new(ExpressionQueryBuilder { parser }),
                Box::new(SortQueryBuilder),
                Box::new(FieldSelectionQueryBuilder),
                Box::new(PagingQueryBuilder { config: paging }),
                Box::new(AggregationsQueryBuilder),
            ],
        }
    }

    /// Append a custom builder after the standard chain
    pub fn with_builder(mut self, builder: Box<dyn QueryBuilder>) -> Self {
        self.builders.push(builder);
        self
    }

    /// Translate an abstract query into a concrete request
    pub fn translate(
        &self,
        query: &RepositoryQuery,
        options: &CommandOptions,
        indices: Vec<String>,
    ) -> Result<SearchRequest> {
        let mut ctx = QueryContext::new(query, options, indices);
        for builder in &self.builders {
            tracing::trace!(builder = builder.name(), "applying query builder");
            ctx = builder.apply(ctx)?;
        }
        Ok(ctx.finish())
    }
}
