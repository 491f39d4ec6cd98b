pub mod consts;
pub mod context;
pub mod error;
pub mod functions;
pub mod name_pool;
pub mod names;
pub mod parser;
pub mod types;
pub mod xdm;

pub use context::{ContextVariable, LanguageLevel, SimpleStaticContext, StaticContext, StaticContextBuilder};
pub use error::{Error, ErrorCode, ErrorKind};
pub use functions::{FunctionBinding, FunctionKind, FunctionLibrary, FunctionSignatures};
pub use parser::ast::{Axis, Expr, ExprKind, Literal};
pub use parser::token::Token;
pub use parser::{ExpressionParser, Language, parse_expression, parse_expression_at, parse_pattern, parse_sequence_type};
pub use types::{AtomicType, ItemType, NodeKind, NodeTest, Occurrence, SchemaType, SequenceType};
pub use xdm::ExpandedName;
