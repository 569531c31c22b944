//! Abstract query model and the translation pipeline that lowers it into a
//! concrete search request.

pub mod builder;
pub mod expression;
pub mod options;
pub mod repository_query;

pub use builder::{QueryBuilder, QueryContext, QueryPipeline};
pub use expression::{DefaultExpressionParser, ExpressionNode, ExpressionParser};
pub use options::CommandOptions;
pub use repository_query::{RepositoryQuery, SoftDeleteMode};
