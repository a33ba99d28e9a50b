pub mod entity;
pub mod filter;
pub mod link;
pub mod point;
pub mod record;
pub mod result;

pub use entity::EntityKind;
pub use filter::{FilterCondition, MatchValue, SearchFilter};
pub use link::{LinkCandidate, ProductServiceLink};
pub use point::{Point, QueryVector, SearchHit, SparseVector};
pub use record::{FaqRecord, ProductRecord, ServiceRecord, SourceRecord};
pub use result::{FaqItem, ProductItem, QueryResult, ResultItem, ServiceItem, format_price};

pub type Payload = serde_json::Map<String, serde_json::Value>;
